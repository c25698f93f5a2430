// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic derivations from the master secret.
//!
//! - Domain fingerprint: HMAC-SHA-256(key = KM, msg = normalized domain).
//! - Session key: HKDF-SHA-256(ikm = KM, salt = empty, info = session nonce), 32 bytes.
//!
//! Neither function touches randomness or I/O. The only randomness on the
//! write path is the session nonce from [`generate_session_nonce`] and the IV
//! drawn inside [`crate::crypto::seal`].

use credvault_core::{DomainFingerprint, VaultError, FINGERPRINT_LEN, KEY_LEN, SESSION_NONCE_LEN};
use ring::{hkdf, hmac};
use zeroize::Zeroizing;

use crate::crypto;
use crate::secret::{MasterSecret, SessionKey};

/// Canonical form of a domain before hashing.
///
/// The input is parsed as an `https` URL (any `scheme://` the caller typed is
/// replaced), so user info, port, path, query and fragment fall away and the
/// host comes back lowercased, IDNA-encoded and with IP literals in canonical
/// form. Trailing `.` and leading `www.` labels are then dropped. The result
/// is a fixed point: normalizing it again changes nothing. Every caller goes
/// through this function, so two spellings of the same site always map to the
/// same fingerprint.
pub fn normalize_domain(domain: &str) -> Result<String, VaultError> {
    let trimmed = domain.trim();
    let invalid = || VaultError::InvalidDomain(format!("`{trimmed}` has no usable host name"));

    let authority = trimmed.split_once("://").map_or(trimmed, |(_, rest)| rest);
    if authority.is_empty()
        || authority.starts_with(['/', '\\', '?', '#'])
        || authority.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    let parsed = url::Url::parse(&format!("https://{authority}")).map_err(|_| invalid())?;
    let mut host = parsed.host_str().ok_or_else(invalid)?.to_string();

    while host.ends_with('.') {
        host.pop();
    }
    while let Some(rest) = host.strip_prefix("www.")
        && !rest.is_empty()
    {
        host = rest.to_string();
    }

    if host.is_empty() {
        return Err(invalid());
    }
    Ok(host)
}

/// HMAC-SHA-256 over `message` keyed by `key`.
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; FINGERPRINT_LEN] {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    let tag = hmac::sign(&key, message);
    let mut out = [0u8; FINGERPRINT_LEN];
    out.copy_from_slice(tag.as_ref());
    out
}

/// HKDF-SHA-256 with an empty salt, 32-byte output.
fn hkdf_sha256(ikm: &[u8], info: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, &[]).extract(ikm);
    let info = [info];
    let okm = prk
        .expand(&info, hkdf::HKDF_SHA256)
        .map_err(|_| VaultError::KeyMaterial("HKDF expand failed".to_string()))?;

    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    okm.fill(out.as_mut())
        .map_err(|_| VaultError::KeyMaterial("HKDF output length mismatch".to_string()))?;
    Ok(out)
}

/// Fingerprint of `domain` under `km`. Normalizes first.
pub fn domain_fingerprint(domain: &str, km: &MasterSecret) -> Result<DomainFingerprint, VaultError> {
    let normalized = normalize_domain(domain)?;
    Ok(DomainFingerprint(hmac_sha256(km.as_bytes(), normalized.as_bytes())))
}

/// Derive the session key for one encryption from `km` and its session nonce.
pub fn derive_session_key(
    km: &MasterSecret,
    session_nonce: &[u8; SESSION_NONCE_LEN],
) -> Result<SessionKey, VaultError> {
    hkdf_sha256(km.as_bytes(), session_nonce).map(SessionKey::new)
}

/// Fresh random session nonce. Generated once per encryption, never reused.
pub fn generate_session_nonce() -> Result<[u8; SESSION_NONCE_LEN], VaultError> {
    crypto::random_bytes()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn km(byte: u8) -> MasterSecret {
        MasterSecret::from_bytes([byte; KEY_LEN]).unwrap()
    }

    #[test]
    fn hmac_matches_rfc4231_case_2() {
        let tag = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hkdf_matches_rfc5869_case_3_prefix() {
        // Empty salt and info, first 32 bytes of the 42-byte OKM.
        let okm = hkdf_sha256(&[0x0b; 22], &[]).unwrap();
        assert_eq!(
            hex::encode(*okm),
            "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d"
        );
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_domain("  Example.COM \n").unwrap(), "example.com");
    }

    #[test]
    fn normalize_strips_scheme_path_port_and_www() {
        let cases = [
            ("https://www.example.com/login?next=/", "example.com"),
            ("http://user:pw@Example.com:8443/x", "example.com"),
            ("www.example.com.", "example.com"),
            ("example.com#frag", "example.com"),
            ("sub.example.com", "sub.example.com"),
            ("www2.example.com", "www2.example.com"),
            ("[::1]", "[::1]"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_domain(input).unwrap(), expected, "input: {input}");
        }
    }

    #[test]
    fn normalize_keeps_bare_www() {
        assert_eq!(normalize_domain("www.").unwrap(), "www");
    }

    #[test]
    fn normalize_rejects_empty_hosts() {
        for input in ["", "   ", "https://", "/path/only", "exa mple.com"] {
            assert!(
                matches!(normalize_domain(input), Err(VaultError::InvalidDomain(_))),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn mixed_case_domain_has_same_fingerprint() {
        let km = km(0x01);
        assert_eq!(
            domain_fingerprint("Example.com", &km).unwrap(),
            domain_fingerprint("example.com", &km).unwrap()
        );
    }

    #[test]
    fn www_and_bare_domain_share_fingerprint() {
        let km = km(0x01);
        assert_eq!(
            domain_fingerprint("https://www.example.com/", &km).unwrap(),
            domain_fingerprint("example.com", &km).unwrap()
        );
    }

    #[test]
    fn different_master_secrets_give_different_fingerprints() {
        assert_ne!(
            domain_fingerprint("example.com", &km(1)).unwrap(),
            domain_fingerprint("example.com", &km(2)).unwrap()
        );
    }

    #[test]
    fn fingerprint_is_hmac_of_normalized_domain() {
        let km = km(0x01);
        let expected = hmac_sha256(&[0x01; KEY_LEN], b"example.com");
        assert_eq!(domain_fingerprint("EXAMPLE.com", &km).unwrap().0, expected);
    }

    #[test]
    fn session_key_is_deterministic() {
        let km = km(3);
        let nonce = [9u8; SESSION_NONCE_LEN];
        let a = derive_session_key(&km, &nonce).unwrap();
        let b = derive_session_key(&km, &nonce).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn session_key_differs_per_nonce_and_from_km() {
        let km = km(3);
        let a = derive_session_key(&km, &[1u8; SESSION_NONCE_LEN]).unwrap();
        let b = derive_session_key(&km, &[2u8; SESSION_NONCE_LEN]).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), km.as_bytes());
    }

    #[test]
    fn session_nonces_are_random() {
        assert_ne!(generate_session_nonce().unwrap(), generate_session_nonce().unwrap());
    }

    #[test]
    fn repeated_www_labels_are_all_dropped() {
        assert_eq!(normalize_domain("www.www.example.com").unwrap(), "example.com");
    }

    #[test]
    fn unbracketed_colon_hosts_are_rejected() {
        for input in ["a:b:c", "fe80::1", "::#", "example.com:port"] {
            assert!(
                matches!(normalize_domain(input), Err(VaultError::InvalidDomain(_))),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn ip_literals_come_back_canonical() {
        assert_eq!(normalize_domain("[FE80:0:0::1]:443").unwrap(), "[fe80::1]");
        assert_eq!(normalize_domain("http://127.0.0.1:8080/").unwrap(), "127.0.0.1");
        assert_eq!(normalize_domain("[fe80::1]").unwrap(), "[fe80::1]");
    }

    #[test]
    fn unicode_and_punycode_spellings_share_fingerprint() {
        assert_eq!(normalize_domain("Bücher.de").unwrap(), "xn--bcher-kva.de");
        let km = km(0x01);
        assert_eq!(
            domain_fingerprint("https://www.Bücher.de/", &km).unwrap(),
            domain_fingerprint("xn--bcher-kva.de", &km).unwrap()
        );
    }

    #[test]
    fn normalized_output_is_a_fixed_point() {
        for input in ["a:b", "[::1]", "www.www.", "Bücher.de.", "user@Example.com:1/x"] {
            if let Ok(once) = normalize_domain(input) {
                assert_eq!(normalize_domain(&once).unwrap(), once, "input: {input:?}");
            }
        }
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(input in "[a-zA-Z0-9:/@.?#\\[\\] -]{0,40}") {
            if let Ok(once) = normalize_domain(&input) {
                prop_assert_eq!(normalize_domain(&once).unwrap(), once);
            }
        }

        #[test]
        fn fingerprint_deterministic(domain in "[a-z]{1,20}\\.[a-z]{2,6}", byte in 1u8..=255) {
            let km = MasterSecret::from_bytes([byte; KEY_LEN]).unwrap();
            prop_assert_eq!(
                domain_fingerprint(&domain, &km).unwrap(),
                domain_fingerprint(&domain, &km).unwrap()
            );
        }

        #[test]
        fn distinct_nonces_give_distinct_keys(a in any::<[u8; 16]>(), b in any::<[u8; 16]>()) {
            prop_assume!(a != b);
            let km = MasterSecret::from_bytes([5u8; KEY_LEN]).unwrap();
            let ka = derive_session_key(&km, &a).unwrap();
            let kb = derive_session_key(&km, &b).unwrap();
            prop_assert_ne!(ka.as_bytes(), kb.as_bytes());
        }
    }
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM encryption with a self-contained wire format.
//!
//! Wire format: `base64(iv) "." base64(ciphertext || tag)`, standard alphabet
//! with padding. Every call to [`seal`] draws a fresh random 96-bit IV from the
//! system CSPRNG. An IV reused under the same key breaks both confidentiality
//! and authenticity of GCM.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use credvault_core::{VaultError, ENTRY_NONCE_LEN, KEY_LEN};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// Length of the GCM authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Separator between the two base64 fields of the wire format.
const WIRE_SEPARATOR: char = '.';

/// An IV together with the ciphertext (tag appended) it produced.
#[derive(Clone, PartialEq, Eq)]
pub struct Sealed {
    /// 96-bit IV, fresh per encryption.
    pub nonce: [u8; ENTRY_NONCE_LEN],
    /// Ciphertext followed by the 16-byte GCM tag.
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    /// Validate and wrap separately stored parts.
    pub fn from_parts(nonce: [u8; ENTRY_NONCE_LEN], ciphertext: Vec<u8>) -> Result<Self, VaultError> {
        if ciphertext.len() < TAG_LEN {
            return Err(VaultError::MalformedCiphertext(format!(
                "ciphertext shorter than the {TAG_LEN}-byte tag"
            )));
        }
        Ok(Self { nonce, ciphertext })
    }

    /// Parse a wire string, running the structural checks that precede decryption.
    pub fn parse(wire: &str) -> Result<Self, VaultError> {
        let fields: Vec<&str> = wire.split(WIRE_SEPARATOR).collect();
        let [iv_b64, ct_b64] = fields.as_slice() else {
            return Err(VaultError::MalformedCiphertext(format!(
                "expected 2 fields, found {}",
                fields.len()
            )));
        };
        if iv_b64.is_empty() || ct_b64.is_empty() {
            return Err(VaultError::MalformedCiphertext("empty field".to_string()));
        }

        let iv = STANDARD
            .decode(iv_b64)
            .map_err(|_| VaultError::MalformedCiphertext("IV is not valid base64".to_string()))?;
        let nonce: [u8; ENTRY_NONCE_LEN] = iv.as_slice().try_into().map_err(|_| {
            VaultError::MalformedCiphertext(format!(
                "IV must be {ENTRY_NONCE_LEN} bytes, got {}",
                iv.len()
            ))
        })?;
        let ciphertext = STANDARD.decode(ct_b64).map_err(|_| {
            VaultError::MalformedCiphertext("ciphertext is not valid base64".to_string())
        })?;

        Self::from_parts(nonce, ciphertext)
    }

    /// Render as a wire string.
    pub fn to_wire(&self) -> String {
        format!(
            "{}{WIRE_SEPARATOR}{}",
            STANDARD.encode(self.nonce),
            STANDARD.encode(&self.ciphertext)
        )
    }
}

impl std::fmt::Debug for Sealed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sealed")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

fn cipher(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| VaultError::KeyMaterial("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt under a fresh random IV.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Sealed, VaultError> {
    let less_safe = cipher(key)?;
    let nonce_bytes: [u8; ENTRY_NONCE_LEN] = random_bytes()?;

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| VaultError::Internal("AES-256-GCM encryption failed".to_string()))?;

    Ok(Sealed {
        nonce: nonce_bytes,
        ciphertext: in_out,
    })
}

/// Decrypt and authenticate. Any cipher failure is [`VaultError::DecryptionFailed`].
pub fn open(key: &[u8; KEY_LEN], sealed: &Sealed) -> Result<Vec<u8>, VaultError> {
    if sealed.ciphertext.len() < TAG_LEN {
        return Err(VaultError::MalformedCiphertext(format!(
            "ciphertext shorter than the {TAG_LEN}-byte tag"
        )));
    }
    let less_safe = cipher(key)?;

    let mut in_out = Zeroizing::new(sealed.ciphertext.clone());
    let plaintext = less_safe
        .open_in_place(
            Nonce::assume_unique_for_key(sealed.nonce),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| VaultError::DecryptionFailed)?;

    Ok(plaintext.to_vec())
}

/// `encrypt(plaintext, key) -> wire string`.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<String, VaultError> {
    Ok(seal(key, plaintext)?.to_wire())
}

/// `decrypt(wire string, key) -> plaintext`.
pub fn decrypt(wire: &str, key: &[u8; KEY_LEN]) -> Result<Vec<u8>, VaultError> {
    open(key, &Sealed::parse(wire)?)
}

/// Fill an array from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], VaultError> {
    let mut out = [0u8; N];
    SystemRandom::new()
        .fill(&mut out)
        .map_err(|_| VaultError::Internal("system RNG failure".to_string()))?;
    Ok(out)
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault core and its collaborators.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use zeroize::Zeroizing;

/// Length in bytes of the master secret and every derived key.
pub const KEY_LEN: usize = 32;

/// Length in bytes of an AES-GCM IV (the entry nonce).
pub const ENTRY_NONCE_LEN: usize = 12;

/// Length in bytes of the HKDF info value (the session nonce).
pub const SESSION_NONCE_LEN: usize = 16;

/// Length in bytes of an HMAC-SHA-256 domain fingerprint.
pub const FINGERPRINT_LEN: usize = 32;

/// Identity of the caller that owns vault entries in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// HMAC-SHA-256 of a normalized domain, keyed by the master secret.
///
/// This is the only lookup key the remote store ever sees. It is not secret,
/// but it is irreversible: the plaintext domain cannot be recovered from it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainFingerprint(pub [u8; FINGERPRINT_LEN]);

impl DomainFingerprint {
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Full lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, enough to correlate log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl TryFrom<&[u8]> for DomainFingerprint {
    type Error = crate::VaultError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; FINGERPRINT_LEN] = bytes.try_into().map_err(|_| {
            crate::VaultError::Internal(format!(
                "fingerprint must be {FINGERPRINT_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl std::fmt::Debug for DomainFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DomainFingerprint({})", self.short_hex())
    }
}

/// The fields written by `create` / `replace`.
#[derive(Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// AES-GCM ciphertext with the 16-byte tag appended.
    pub payload: Vec<u8>,
    /// Raw 12-byte IV used for `payload`.
    pub entry_nonce: [u8; ENTRY_NONCE_LEN],
    /// Raw 16-byte HKDF info value the session key was derived from.
    pub session_nonce: [u8; SESSION_NONCE_LEN],
}

impl std::fmt::Debug for NewEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewEntry")
            .field("payload_len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

/// A stored entry as returned by `fetch`.
///
/// Nonce fields are kept as raw byte blobs: rows written by older clients may
/// hold the base64 text of the nonce instead of the nonce itself.
#[derive(Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// AES-GCM ciphertext with the tag appended.
    pub payload: Vec<u8>,
    /// IV of the payload encryption, raw or legacy base64 text.
    pub entry_nonce: Vec<u8>,
    /// HKDF info for the session key, raw or legacy base64 text.
    pub session_nonce: Vec<u8>,
    /// Unix timestamp in milliseconds, set by the store on `create`.
    pub created_at: i64,
}

impl std::fmt::Debug for EntryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryRecord")
            .field("payload_len", &self.payload.len())
            .field("entry_nonce_len", &self.entry_nonce.len())
            .field("session_nonce_len", &self.session_nonce.len())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A decrypted credential.
#[derive(Clone)]
pub struct Credential {
    /// Normalized domain the credential belongs to.
    pub domain: String,
    pub username: String,
    /// Never printed by `Debug`.
    pub password: SecretString,
}

impl Credential {
    pub fn new(
        domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
            && self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Proof of identity handed to the key-recovery collaborator.
///
/// `token` is the time-boxed authorization token; `identity` keys the
/// session cache.
#[derive(Clone)]
pub struct IdentityProof {
    /// Stable caller identity; also the session cache key.
    pub identity: String,
    /// Time-boxed authorization token for the key-share service.
    pub token: SecretString,
}

impl IdentityProof {
    pub fn new(identity: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            token: SecretString::from(token.into()),
        }
    }
}

impl std::fmt::Debug for IdentityProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProof")
            .field("identity", &self.identity)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// One candidate secret share returned by the key-share service.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyShare(pub Zeroizing<Vec<u8>>);

impl KeyShare {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for KeyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyShare([REDACTED; {}])", self.0.len())
    }
}

/// Which branch of the check-then-branch write actually landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

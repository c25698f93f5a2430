// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the credvault workspace.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across collaborator traits and vault operations.
///
/// Messages never carry key material, nonces, or plaintext. Cryptographic
/// failures are reported with fixed strings only.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Master secret or derived key has the wrong shape. Fatal, never retried.
    #[error("invalid key material: {0}")]
    KeyMaterial(String),

    /// Domain string normalizes to nothing usable.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// Wire string failed a structural pre-check before reaching the cipher.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// AES-GCM open failed (bad tag, wrong key, corrupted entry).
    #[error("cannot decrypt this entry")]
    DecryptionFailed,

    /// Raw failure reported by a store or recovery backend. Transient.
    #[error("store error: {message}")]
    Store {
        /// Backend description, free of key material.
        message: String,
        /// Underlying driver or transport error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transient failures persisted after bounded retries.
    #[error("store unavailable during {operation} after {attempts} attempt(s): {message}")]
    StoreUnavailable {
        /// Lifecycle step that gave up (`exists`, `fetch`, `upsert`, `delete`).
        operation: &'static str,
        /// Attempts made, including the first.
        attempts: u32,
        /// Message of the last transient failure.
        message: String,
    },

    /// A store or recovery call did not finish in time.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        /// Call that timed out.
        operation: &'static str,
        /// Per-call limit that was exceeded.
        duration: Duration,
    },

    /// `create` hit an existing `(owner, fingerprint)` row.
    #[error("an entry already exists for this fingerprint")]
    DuplicateKey,

    /// No entry exists for this `(owner, fingerprint)`.
    #[error("no entry for this fingerprint")]
    NotFound,

    /// The store refused the caller identity for this entry.
    #[error("caller is not permitted to modify this entry")]
    Forbidden,

    /// Credential payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The key-recovery collaborator could not produce a master secret.
    #[error("key recovery failed: {0}")]
    KeyRecovery(String),

    /// Invalid runtime configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors (RNG failure, key construction).
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Build a transient store error from any backend error.
    pub fn store<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Timeout { .. })
    }

    /// Whether this error means the entry cannot be decrypted with the given key.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::MalformedCiphertext(_) | Self::DecryptionFailed)
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T, E = VaultError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(VaultError::store("down", std::io::Error::other("boom")).is_transient());
        assert!(VaultError::Timeout {
            operation: "fetch",
            duration: Duration::from_secs(5),
        }
        .is_transient());
        assert!(!VaultError::DuplicateKey.is_transient());
        assert!(!VaultError::DecryptionFailed.is_transient());
        assert!(!VaultError::KeyMaterial("short".into()).is_transient());
    }

    #[test]
    fn decryption_failure_classification() {
        assert!(VaultError::DecryptionFailed.is_decryption_failure());
        assert!(VaultError::MalformedCiphertext("iv".into()).is_decryption_failure());
        assert!(!VaultError::NotFound.is_decryption_failure());
    }

    #[test]
    fn decryption_failed_message_is_generic() {
        assert_eq!(
            VaultError::DecryptionFailed.to_string(),
            "cannot decrypt this entry"
        );
    }
}

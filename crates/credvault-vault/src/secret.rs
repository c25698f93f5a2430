// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key material: the master secret (KM) and per-encryption session keys (KS).
//!
//! Both wrap their bytes in [`Zeroizing`] so every copy is overwritten when it
//! is dropped. Debug output never shows the bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use credvault_core::{VaultError, KEY_LEN};
use zeroize::{Zeroize, Zeroizing};

/// The 256-bit root key of a user's vault.
///
/// Produced by the key-recovery boundary, held for the session, never
/// persisted in plaintext. A wrong-length or all-zero value is rejected up
/// front: deriving from it would yield fingerprints no later session can match.
#[derive(Clone)]
pub struct MasterSecret(Zeroizing<[u8; KEY_LEN]>);

impl MasterSecret {
    /// Wrap 32 raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Result<Self, VaultError> {
        let secret = Self(Zeroizing::new(bytes));
        if secret.0.iter().all(|b| *b == 0) {
            return Err(VaultError::KeyMaterial(
                "master secret must not be all zero bytes".to_string(),
            ));
        }
        Ok(secret)
    }

    /// Copy from a slice, which must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.len() != KEY_LEN {
            return Err(VaultError::KeyMaterial(format!(
                "master secret must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut array = Zeroizing::new([0u8; KEY_LEN]);
        array.copy_from_slice(bytes);
        Self::from_bytes(*array)
    }

    /// Parse the base64 at-rest representation.
    pub fn from_base64(encoded: &str) -> Result<Self, VaultError> {
        let decoded = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|_| {
            VaultError::KeyMaterial("master secret is not valid base64".to_string())
        })?);
        Self::from_slice(&decoded)
    }

    /// Base64 rendering for handing KM to another trusted context.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(&self.0[..]))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Overwrite the key bytes in place. The value is unusable afterwards.
    pub fn clear(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// A 256-bit key derived for exactly one encryption.
pub struct SessionKey(Zeroizing<[u8; KEY_LEN]>);

impl SessionKey {
    pub(crate) fn new(bytes: Zeroizing<[u8; KEY_LEN]>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

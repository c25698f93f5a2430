// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential operations exposed to the extension/UI layer.
//!
//! Write path: normalize domain, fingerprint it, serialize the
//! `{domain, username, password}` record, derive a session key from a fresh
//! session nonce, seal under a fresh IV, upsert.
//!
//! Read path: fetch, normalize legacy nonces, re-derive the session key from
//! the stored session nonce, open with the stored entry nonce, parse.

use std::sync::Arc;

use credvault_config::VaultConfig;
use credvault_core::{Credential, EntryStore, NewEntry, OwnerId, UpsertOutcome, VaultError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, Sealed};
use crate::kdf;
use crate::lifecycle::{EntryLifecycle, LifecyclePolicy};
use crate::secret::MasterSecret;

/// The plaintext that gets encrypted.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct CredentialPayload {
    domain: String,
    username: String,
    password: String,
}

/// Credential vault bound to one entry store.
#[derive(Debug, Clone)]
pub struct CredentialVault {
    lifecycle: EntryLifecycle,
}

impl CredentialVault {
    pub fn new(store: Arc<dyn EntryStore>, policy: LifecyclePolicy) -> Self {
        Self {
            lifecycle: EntryLifecycle::new(store, policy),
        }
    }

    pub fn from_config(store: Arc<dyn EntryStore>, config: &VaultConfig) -> Self {
        Self::new(store, LifecyclePolicy::from(config))
    }

    pub fn lifecycle(&self) -> &EntryLifecycle {
        &self.lifecycle
    }

    /// Encrypt and store a credential, replacing any existing one for the domain.
    pub async fn save_credential(
        &self,
        domain: &str,
        username: &str,
        password: &SecretString,
        km: &MasterSecret,
        owner: &OwnerId,
    ) -> Result<UpsertOutcome, VaultError> {
        let normalized = kdf::normalize_domain(domain)?;
        let fingerprint = kdf::domain_fingerprint(domain, km)?;

        let payload = CredentialPayload {
            domain: normalized,
            username: username.to_string(),
            password: password.expose_secret().to_string(),
        };
        let plaintext = Zeroizing::new(
            serde_json::to_vec(&payload).map_err(|e| VaultError::Serialization(e.to_string()))?,
        );

        let session_nonce = kdf::generate_session_nonce()?;
        let session_key = kdf::derive_session_key(km, &session_nonce)?;
        let sealed = crypto::seal(session_key.as_bytes(), &plaintext)?;

        let entry = NewEntry {
            payload: sealed.ciphertext,
            entry_nonce: sealed.nonce,
            session_nonce,
        };
        self.lifecycle.upsert(owner, &fingerprint, &entry).await
    }

    /// Fetch and decrypt the credential for `domain`, or `None` if there is none.
    pub async fn load_credential(
        &self,
        domain: &str,
        km: &MasterSecret,
        owner: &OwnerId,
    ) -> Result<Option<Credential>, VaultError> {
        let normalized = kdf::normalize_domain(domain)?;
        let fingerprint = kdf::domain_fingerprint(domain, km)?;

        let Some(stored) = self.lifecycle.fetch(owner, &fingerprint).await? else {
            debug!(owner = %owner, fingerprint = %fingerprint.short_hex(), "no credential stored");
            return Ok(None);
        };

        let session_key = kdf::derive_session_key(km, &stored.session_nonce)?;
        let sealed = Sealed::from_parts(stored.entry_nonce, stored.ciphertext)?;
        let plaintext = Zeroizing::new(crypto::open(session_key.as_bytes(), &sealed)?);

        let mut payload: CredentialPayload =
            serde_json::from_slice(&plaintext).map_err(|_| {
                VaultError::Serialization("decrypted entry is not a credential record".to_string())
            })?;

        // The record names its own domain; a row filed under another fingerprint
        // of the same owner must not be served for this one.
        if payload.domain != normalized {
            warn!(
                owner = %owner,
                fingerprint = %fingerprint.short_hex(),
                "decrypted record belongs to a different domain"
            );
            return Err(VaultError::DecryptionFailed);
        }

        Ok(Some(Credential {
            domain: normalized,
            username: std::mem::take(&mut payload.username),
            password: SecretString::from(std::mem::take(&mut payload.password)),
        }))
    }

    /// Whether a credential is stored for `domain`.
    pub async fn credential_exists(
        &self,
        domain: &str,
        km: &MasterSecret,
        owner: &OwnerId,
    ) -> Result<bool, VaultError> {
        let fingerprint = kdf::domain_fingerprint(domain, km)?;
        self.lifecycle.exists(owner, &fingerprint).await
    }

    /// Delete the credential for `domain`. Deleting a missing credential succeeds.
    pub async fn delete_credential(
        &self,
        domain: &str,
        km: &MasterSecret,
        owner: &OwnerId,
    ) -> Result<(), VaultError> {
        let fingerprint = kdf::domain_fingerprint(domain, km)?;
        self.lifecycle.delete(owner, &fingerprint).await
    }
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped cache of master secrets.
//!
//! A [`VaultSession`] is created at login, owned by the caller, and passed to
//! the operations that need KM. It is the only place KM is written: the
//! recovery path populates it at most once per identity, and [`VaultSession::clear`]
//! zeroizes every cached copy at logout.

use std::collections::HashMap;

use credvault_core::{IdentityProof, VaultError};
use tokio::sync::Mutex;
use tracing::info;

use crate::recovery::MasterSecretRecovery;
use crate::secret::MasterSecret;

pub struct VaultSession {
    recovery: MasterSecretRecovery,
    secrets: Mutex<HashMap<String, MasterSecret>>,
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("recovery", &self.recovery)
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

impl VaultSession {
    pub fn new(recovery: MasterSecretRecovery) -> Self {
        Self {
            recovery,
            secrets: Mutex::new(HashMap::new()),
        }
    }

    /// KM for the proven identity, recovering it on first use.
    ///
    /// The cache lock is held across recovery, so concurrent callers for the
    /// same identity trigger a single recovery and all observe the same KM.
    /// A failed recovery caches nothing.
    pub async fn master_secret(&self, proof: &IdentityProof) -> Result<MasterSecret, VaultError> {
        let mut secrets = self.secrets.lock().await;
        if let Some(km) = secrets.get(&proof.identity) {
            return Ok(km.clone());
        }

        let km = self.recovery.recover(proof).await?;
        secrets.insert(proof.identity.clone(), km.clone());
        info!(identity = %proof.identity, "master secret cached for session");
        Ok(km)
    }

    /// Whether KM for `identity` is cached.
    pub async fn is_cached(&self, identity: &str) -> bool {
        self.secrets.lock().await.contains_key(identity)
    }

    /// Zeroize and drop the cached KM of one identity.
    pub async fn forget(&self, identity: &str) {
        if let Some(mut km) = self.secrets.lock().await.remove(identity) {
            km.clear();
        }
    }

    /// Zeroize and drop every cached KM (logout).
    pub async fn clear(&self) {
        let mut secrets = self.secrets.lock().await;
        let count = secrets.len();
        for (_, mut km) in secrets.drain() {
            km.clear();
        }
        info!(cleared = count, "vault session cleared");
    }
}

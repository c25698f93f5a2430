// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-secret recovery through the threshold key-share service.
//!
//! The service may return more than one distinct share for one identity while
//! an authorization is still settling. Picking different shares in different
//! sessions would derive different master secrets and strand every entry
//! written under the other one, so the choice is always the lexicographically
//! smallest share ([`pick_canonical`]).

use std::sync::Arc;
use std::time::Duration;

use credvault_config::VaultConfig;
use credvault_core::{IdentityProof, KeyShare, KeyShareService, VaultError};
use tracing::{debug, warn};

use crate::secret::MasterSecret;

/// Canonical share: the lexicographically smallest byte sequence, or `None` if empty.
///
/// Order of `shares` and duplicates do not affect the result.
pub fn pick_canonical(shares: &[KeyShare]) -> Option<&KeyShare> {
    shares.iter().min_by(|a, b| a.as_bytes().cmp(b.as_bytes()))
}

/// Wraps a [`KeyShareService`] with timeouts and the canonical share choice.
#[derive(Clone)]
pub struct MasterSecretRecovery {
    service: Arc<dyn KeyShareService>,
    timeout: Duration,
}

impl std::fmt::Debug for MasterSecretRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSecretRecovery")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MasterSecretRecovery {
    pub fn new(service: Arc<dyn KeyShareService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn from_config(service: Arc<dyn KeyShareService>, config: &VaultConfig) -> Self {
        Self::new(service, Duration::from_millis(config.recovery_timeout_ms))
    }

    /// Request shares, pick the canonical one, and reconstruct KM from it.
    pub async fn recover(&self, proof: &IdentityProof) -> Result<MasterSecret, VaultError> {
        let shares = tokio::time::timeout(self.timeout, self.service.request_shares(proof))
            .await
            .map_err(|_| VaultError::Timeout {
                operation: "request_shares",
                duration: self.timeout,
            })??;

        let canonical = pick_canonical(&shares).ok_or_else(|| {
            VaultError::KeyRecovery("key-share service returned no shares".to_string())
        })?;
        let distinct = count_distinct(&shares);
        if distinct > 1 {
            warn!(
                identity = %proof.identity,
                candidates = distinct,
                "multiple key shares observed, using canonical share"
            );
        }

        let km_bytes = tokio::time::timeout(self.timeout, self.service.reconstruct(proof, canonical))
            .await
            .map_err(|_| VaultError::Timeout {
                operation: "reconstruct",
                duration: self.timeout,
            })??;

        let km = MasterSecret::from_slice(&km_bytes)?;
        debug!(identity = %proof.identity, "master secret recovered");
        Ok(km)
    }
}

fn count_distinct(shares: &[KeyShare]) -> usize {
    let mut sorted: Vec<&[u8]> = shares.iter().map(KeyShare::as_bytes).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

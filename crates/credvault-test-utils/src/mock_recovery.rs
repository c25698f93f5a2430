// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock threshold key-share service for deterministic testing.
//!
//! Each registered share reconstructs to a fixed master secret, so tests can
//! tell which share a caller picked from the KM it ends up with.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use credvault_core::{IdentityProof, KeyShare, KeyShareService, VaultError};

/// A key-share service that hands out pre-registered shares.
pub struct MockKeyShareService {
    /// Shares returned by `request_shares`, in the order given.
    shares: Mutex<Vec<KeyShare>>,
    /// Share bytes to the master secret they reconstruct to.
    secrets: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    /// Errors returned by the next `request_shares` calls.
    failures: Mutex<VecDeque<VaultError>>,
    delay: Mutex<Option<Duration>>,
    reconstructed: Mutex<Vec<KeyShare>>,
    request_calls: AtomicUsize,
}

impl MockKeyShareService {
    /// Create a service with no shares registered.
    pub fn new() -> Self {
        Self {
            shares: Mutex::new(Vec::new()),
            secrets: Mutex::new(HashMap::new()),
            failures: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
            reconstructed: Mutex::new(Vec::new()),
            request_calls: AtomicUsize::new(0),
        }
    }

    /// Create a service holding one share that reconstructs to `km`.
    pub fn with_share(share: &[u8], km: [u8; 32]) -> Self {
        let mut service = Self::new();
        service.shares.get_mut().push(KeyShare::new(share.to_vec()));
        service.secrets.get_mut().insert(share.to_vec(), km.to_vec());
        service
    }

    /// Register another share and the master secret it reconstructs to.
    pub async fn add_share(&self, share: &[u8], km: &[u8]) {
        self.shares.lock().await.push(KeyShare::new(share.to_vec()));
        self.secrets.lock().await.insert(share.to_vec(), km.to_vec());
    }

    /// Make the next `request_shares` call fail with `error`.
    pub async fn fail_next(&self, error: VaultError) {
        self.failures.lock().await.push_back(error);
    }

    /// Sleep this long inside every call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Number of `request_shares` calls so far.
    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    /// Shares passed to `reconstruct`, in call order.
    pub async fn reconstructed(&self) -> Vec<KeyShare> {
        self.reconstructed.lock().await.clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockKeyShareService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyShareService for MockKeyShareService {
    async fn request_shares(&self, proof: &IdentityProof) -> Result<Vec<KeyShare>, VaultError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(error) = self.failures.lock().await.pop_front() {
            return Err(error);
        }
        tracing::debug!(identity = %proof.identity, "mock key shares requested");
        Ok(self.shares.lock().await.clone())
    }

    async fn reconstruct(
        &self,
        _proof: &IdentityProof,
        share: &KeyShare,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        self.pause().await;
        self.reconstructed.lock().await.push(share.clone());
        self.secrets
            .lock()
            .await
            .get(share.as_bytes())
            .map(|km| Zeroizing::new(km.clone()))
            .ok_or_else(|| VaultError::KeyRecovery("unknown key share".to_string()))
    }
}

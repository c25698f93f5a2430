// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threshold key-share service that reconstructs the master secret.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::types::{IdentityProof, KeyShare};

/// External key-recovery collaborator.
///
/// Obtaining shares involves network round trips and proof verification, so
/// callers go through a session cache and ask at most once per identity.
#[async_trait]
pub trait KeyShareService: Send + Sync + 'static {
    /// Request the secret share(s) for the proven identity.
    ///
    /// Under retried or concurrent requests the service may hand back more
    /// than one distinct share before the authorization settles. All of them
    /// are returned; the caller picks one deterministically.
    async fn request_shares(&self, proof: &IdentityProof) -> Result<Vec<KeyShare>, VaultError>;

    /// Reconstruct the 32-byte master secret from the chosen share.
    async fn reconstruct(
        &self,
        proof: &IdentityProof,
        share: &KeyShare,
    ) -> Result<Zeroizing<Vec<u8>>, VaultError>;
}

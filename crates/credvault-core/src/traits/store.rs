// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote object store holding encrypted vault entries.

use async_trait::async_trait;

use crate::error::VaultError;
use crate::types::{DomainFingerprint, EntryRecord, NewEntry, OwnerId};

/// Append/overwrite object store addressed by `(owner, fingerprint)`.
///
/// The store has no native upsert. It must reject a second `create` for the
/// same key with [`VaultError::DuplicateKey`], and it enforces that only the
/// creator of an entry may replace or remove it. Transient failures are
/// reported as [`VaultError::Store`].
#[async_trait]
pub trait EntryStore: Send + Sync + 'static {
    /// Human-readable backend name, used in log fields.
    fn name(&self) -> &str;

    /// Read-only existence probe.
    async fn exists(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<bool, VaultError>;

    /// Insert a new entry. Fails with [`VaultError::DuplicateKey`] if one exists.
    async fn create(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<(), VaultError>;

    /// Overwrite payload and nonces of an existing entry.
    /// Fails with [`VaultError::NotFound`] if there is none.
    async fn replace(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<(), VaultError>;

    /// Read the stored fields, or `None` if there is no entry.
    async fn fetch(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<Option<EntryRecord>, VaultError>;

    /// Remove an entry. Removing a missing entry succeeds.
    async fn remove(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<(), VaultError>;
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`EntryStore`] with fault injection.
//!
//! Faults are queued per operation and consumed in FIFO order, one per call.
//! Calls with no queued fault behave like a healthy store.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use credvault_core::{DomainFingerprint, EntryRecord, EntryStore, NewEntry, OwnerId, VaultError};

/// Store operations, used to target faults and read call counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Exists,
    Create,
    Replace,
    Fetch,
    Remove,
}

/// A scripted misbehaviour for one call.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Fail with a transient [`VaultError::Store`] without touching the data.
    Transient,
    /// Sleep before answering. Use with paused tokio time to provoke timeouts.
    Delay(Duration),
    /// `exists` only: answer with this value regardless of the data, as if
    /// another writer changed the entry right after the probe.
    StaleExists(bool),
    /// Fail with [`VaultError::Forbidden`].
    Forbidden,
}

type Key = (String, [u8; 32]);

/// In-memory entry store keyed by `(owner, fingerprint)`.
pub struct MemoryEntryStore {
    entries: Mutex<HashMap<Key, EntryRecord>>,
    faults: Mutex<HashMap<StoreOp, VecDeque<Fault>>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a fault for the next call of `op`.
    pub async fn inject(&self, op: StoreOp, fault: Fault) {
        self.faults.lock().await.entry(op).or_default().push_back(fault);
    }

    /// Queue the same fault `times` times.
    pub async fn inject_n(&self, op: StoreOp, fault: Fault, times: usize) {
        let mut faults = self.faults.lock().await;
        let queue = faults.entry(op).or_default();
        for _ in 0..times {
            queue.push_back(fault.clone());
        }
    }

    /// Insert a row as-is, bypassing the trait. Used for rows written by
    /// older clients.
    pub async fn insert_raw(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        record: EntryRecord,
    ) {
        self.entries.lock().await.insert(key(owner, fingerprint), record);
    }

    /// Current row, bypassing the trait and fault injection.
    pub async fn raw(&self, owner: &OwnerId, fingerprint: &DomainFingerprint) -> Option<EntryRecord> {
        self.entries.lock().await.get(&key(owner, fingerprint)).cloned()
    }

    /// Number of rows held for all owners.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of times `op` was called through the trait.
    pub async fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().await.get(&op).copied().unwrap_or(0)
    }

    /// Count the call and apply any queued fault. Returns the stale `exists`
    /// answer if one was scripted.
    async fn enter(&self, op: StoreOp) -> Result<Option<bool>, VaultError> {
        *self.calls.lock().await.entry(op).or_default() += 1;

        let fault = self
            .faults
            .lock()
            .await
            .get_mut(&op)
            .and_then(VecDeque::pop_front);

        match fault {
            None => Ok(None),
            Some(Fault::Transient) => {
                tracing::debug!(?op, "injected transient failure");
                Err(VaultError::store(
                    format!("injected failure on {op:?}"),
                    std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
                ))
            }
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(None)
            }
            Some(Fault::StaleExists(answer)) => Ok(Some(answer)),
            Some(Fault::Forbidden) => Err(VaultError::Forbidden),
        }
    }
}

impl Default for MemoryEntryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key(owner: &OwnerId, fingerprint: &DomainFingerprint) -> Key {
    (owner.as_str().to_string(), *fingerprint.as_bytes())
}

fn record_from(entry: &NewEntry, created_at: i64) -> EntryRecord {
    EntryRecord {
        payload: entry.payload.clone(),
        entry_nonce: entry.entry_nonce.to_vec(),
        session_nonce: entry.session_nonce.to_vec(),
        created_at,
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn exists(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<bool, VaultError> {
        if let Some(answer) = self.enter(StoreOp::Exists).await? {
            return Ok(answer);
        }
        Ok(self.entries.lock().await.contains_key(&key(owner, fingerprint)))
    }

    async fn create(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<(), VaultError> {
        self.enter(StoreOp::Create).await?;
        let mut entries = self.entries.lock().await;
        let key = key(owner, fingerprint);
        if entries.contains_key(&key) {
            return Err(VaultError::DuplicateKey);
        }
        entries.insert(key, record_from(entry, chrono::Utc::now().timestamp_millis()));
        Ok(())
    }

    async fn replace(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<(), VaultError> {
        self.enter(StoreOp::Replace).await?;
        let mut entries = self.entries.lock().await;
        let Some(existing) = entries.get_mut(&key(owner, fingerprint)) else {
            return Err(VaultError::NotFound);
        };
        *existing = record_from(entry, existing.created_at);
        Ok(())
    }

    async fn fetch(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<Option<EntryRecord>, VaultError> {
        self.enter(StoreOp::Fetch).await?;
        Ok(self.entries.lock().await.get(&key(owner, fingerprint)).cloned())
    }

    async fn remove(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<(), VaultError> {
        self.enter(StoreOp::Remove).await?;
        self.entries.lock().await.remove(&key(owner, fingerprint));
        Ok(())
    }
}

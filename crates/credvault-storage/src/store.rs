// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`EntryStore`] trait.

use async_trait::async_trait;
use rusqlite::{params, ErrorCode, OptionalExtension};
use tracing::debug;

use credvault_core::{DomainFingerprint, EntryRecord, EntryStore, NewEntry, OwnerId, VaultError};

use crate::database::{map_tr_err, Database};

/// Entry store backed by the `vault_entries` table.
///
/// Rows are addressed by `(owner_id, fingerprint)`, so an owner can only ever
/// see, replace, or remove the rows it created.
#[derive(Debug, Clone)]
pub struct SqliteEntryStore {
    db: Database,
}

impl SqliteEntryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn exists(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<bool, VaultError> {
        let owner = owner.as_str().to_string();
        let fingerprint = fingerprint.as_bytes().to_vec();
        self.db
            .connection()
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM vault_entries WHERE owner_id = ?1 AND fingerprint = ?2)",
                    params![owner, fingerprint],
                    |row| row.get(0),
                )
            })
            .await
            .map_err(map_tr_err)
    }

    async fn create(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<(), VaultError> {
        let owner = owner.as_str().to_string();
        let fingerprint = fingerprint.as_bytes().to_vec();
        let entry = entry.clone();
        let inserted = self
            .db
            .connection()
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let now = now_millis();
                let result = conn.execute(
                    "INSERT INTO vault_entries
                         (owner_id, fingerprint, payload, entry_nonce, session_nonce, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        owner,
                        fingerprint,
                        entry.payload,
                        entry.entry_nonce.as_slice(),
                        entry.session_nonce.as_slice(),
                        now,
                    ],
                );
                match result {
                    Ok(_) => Ok(true),
                    Err(e) if is_constraint_violation(&e) => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)?;

        if inserted {
            Ok(())
        } else {
            Err(VaultError::DuplicateKey)
        }
    }

    async fn replace(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<(), VaultError> {
        let owner = owner.as_str().to_string();
        let fingerprint = fingerprint.as_bytes().to_vec();
        let entry = entry.clone();
        let updated = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE vault_entries
                     SET payload = ?3, entry_nonce = ?4, session_nonce = ?5, updated_at = ?6
                     WHERE owner_id = ?1 AND fingerprint = ?2",
                    params![
                        owner,
                        fingerprint,
                        entry.payload,
                        entry.entry_nonce.as_slice(),
                        entry.session_nonce.as_slice(),
                        now_millis(),
                    ],
                )
            })
            .await
            .map_err(map_tr_err)?;

        match updated {
            0 => Err(VaultError::NotFound),
            _ => Ok(()),
        }
    }

    async fn fetch(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<Option<EntryRecord>, VaultError> {
        let owner = owner.as_str().to_string();
        let fingerprint = fingerprint.as_bytes().to_vec();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<EntryRecord>, rusqlite::Error> {
                conn.query_row(
                    "SELECT payload, entry_nonce, session_nonce, created_at
                     FROM vault_entries WHERE owner_id = ?1 AND fingerprint = ?2",
                    params![owner, fingerprint],
                    |row| {
                        Ok(EntryRecord {
                            payload: row.get(0)?,
                            entry_nonce: row.get(1)?,
                            session_nonce: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<(), VaultError> {
        let owner_id = owner.as_str().to_string();
        let fp = fingerprint.as_bytes().to_vec();
        let removed = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM vault_entries WHERE owner_id = ?1 AND fingerprint = ?2",
                    params![owner_id, fp],
                )
            })
            .await
            .map_err(map_tr_err)?;
        debug!(owner = %owner, fingerprint = %fingerprint.short_hex(), removed, "vault row delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8) -> NewEntry {
        NewEntry {
            payload: vec![byte; 40],
            entry_nonce: [byte; 12],
            session_nonce: [byte; 16],
        }
    }

    async fn store() -> SqliteEntryStore {
        SqliteEntryStore::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn create_then_fetch_returns_raw_fields() {
        let store = store().await;
        let owner = OwnerId::new("alice");
        let fp = DomainFingerprint([3; 32]);

        assert!(!store.exists(&owner, &fp).await.unwrap());
        store.create(&owner, &fp, &entry(9)).await.unwrap();
        assert!(store.exists(&owner, &fp).await.unwrap());

        let record = store.fetch(&owner, &fp).await.unwrap().unwrap();
        assert_eq!(record.payload, vec![9; 40]);
        assert_eq!(record.entry_nonce, vec![9; 12]);
        assert_eq!(record.session_nonce, vec![9; 16]);
        assert!(record.created_at > 0);
    }

    #[tokio::test]
    async fn duplicate_create_maps_to_duplicate_key() {
        let store = store().await;
        let owner = OwnerId::new("alice");
        let fp = DomainFingerprint([3; 32]);
        store.create(&owner, &fp, &entry(1)).await.unwrap();
        assert!(matches!(
            store.create(&owner, &fp, &entry(2)).await,
            Err(VaultError::DuplicateKey)
        ));
        let record = store.fetch(&owner, &fp).await.unwrap().unwrap();
        assert_eq!(record.payload, vec![1; 40]);
    }

    #[tokio::test]
    async fn replace_preserves_created_at() {
        let store = store().await;
        let owner = OwnerId::new("alice");
        let fp = DomainFingerprint([3; 32]);
        store.create(&owner, &fp, &entry(1)).await.unwrap();
        let before = store.fetch(&owner, &fp).await.unwrap().unwrap();

        store.replace(&owner, &fp, &entry(2)).await.unwrap();
        let after = store.fetch(&owner, &fp).await.unwrap().unwrap();
        assert_eq!(after.payload, vec![2; 40]);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn replace_missing_is_not_found() {
        let store = store().await;
        let result = store
            .replace(&OwnerId::new("alice"), &DomainFingerprint([3; 32]), &entry(1))
            .await;
        assert!(matches!(result, Err(VaultError::NotFound)));
    }

    #[tokio::test]
    async fn other_owner_cannot_touch_entry() {
        let store = store().await;
        let alice = OwnerId::new("alice");
        let mallory = OwnerId::new("mallory");
        let fp = DomainFingerprint([3; 32]);
        store.create(&alice, &fp, &entry(1)).await.unwrap();

        assert!(store.fetch(&mallory, &fp).await.unwrap().is_none());
        assert!(matches!(
            store.replace(&mallory, &fp, &entry(2)).await,
            Err(VaultError::NotFound)
        ));
        store.remove(&mallory, &fp).await.unwrap();
        assert!(store.exists(&alice, &fp).await.unwrap());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = store().await;
        let owner = OwnerId::new("alice");
        let fp = DomainFingerprint([3; 32]);
        store.remove(&owner, &fp).await.unwrap();
        store.create(&owner, &fp, &entry(1)).await.unwrap();
        store.remove(&owner, &fp).await.unwrap();
        store.remove(&owner, &fp).await.unwrap();
        assert!(store.fetch(&owner, &fp).await.unwrap().is_none());
    }
}

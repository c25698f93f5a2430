// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential vault running against the SQLite reference store.

use std::sync::Arc;

use credvault_config::{load_and_validate_str, CredvaultConfig};
use credvault_core::{IdentityProof, OwnerId, UpsertOutcome};
use credvault_storage::{Database, SqliteEntryStore};
use credvault_test_utils::MockKeyShareService;
use credvault_vault::{CredentialVault, MasterSecretRecovery, VaultSession};
use secrecy::{ExposeSecret, SecretString};
use tempfile::tempdir;

fn config_for(path: &str) -> CredvaultConfig {
    let toml = format!(
        r#"
[vault]
store_timeout_ms = 2000
max_retries = 2
retry_backoff_ms = 5

[storage]
database_path = "{path}"
"#
    );
    load_and_validate_str(&toml).unwrap()
}

#[tokio::test]
async fn full_session_against_sqlite() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("vault.db").display().to_string();
    let config = config_for(&db_path);

    let db = Database::from_config(&config.storage).await.unwrap();
    let store = Arc::new(SqliteEntryStore::new(db));
    let vault = CredentialVault::from_config(store, &config.vault);

    let service = Arc::new(MockKeyShareService::with_share(b"share-a", [0x33; 32]));
    let session = VaultSession::new(MasterSecretRecovery::from_config(service, &config.vault));
    let proof = IdentityProof::new("alice@example.org", "token");
    let owner = OwnerId::new("alice@example.org");

    let km = session.master_secret(&proof).await.unwrap();
    let password = SecretString::from("p@ss".to_string());
    assert_eq!(
        vault
            .save_credential("example.com", "alice", &password, &km, &owner)
            .await
            .unwrap(),
        UpsertOutcome::Created
    );
    let updated = SecretString::from("p@ss-2".to_string());
    assert_eq!(
        vault
            .save_credential("www.example.com", "alice", &updated, &km, &owner)
            .await
            .unwrap(),
        UpsertOutcome::Replaced
    );

    let credential = vault
        .load_credential("example.com", &km, &owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credential.username, "alice");
    assert_eq!(credential.password.expose_secret(), "p@ss-2");

    vault.delete_credential("example.com", &km, &owner).await.unwrap();
    assert!(vault.load_credential("example.com", &km, &owner).await.unwrap().is_none());

    session.clear().await;
    assert!(!session.is_cached("alice@example.org").await);
}

#[tokio::test]
async fn entries_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("vault.db").display().to_string();
    let config = config_for(&db_path);
    let km = credvault_vault::MasterSecret::from_bytes([0x44; 32]).unwrap();
    let owner = OwnerId::new("owner-1");

    {
        let db = Database::from_config(&config.storage).await.unwrap();
        let vault = CredentialVault::from_config(Arc::new(SqliteEntryStore::new(db.clone())), &config.vault);
        vault
            .save_credential("example.com", "alice", &SecretString::from("p@ss".to_string()), &km, &owner)
            .await
            .unwrap();
        db.checkpoint().await.unwrap();
    }

    let db = Database::from_config(&config.storage).await.unwrap();
    let vault = CredentialVault::from_config(Arc::new(SqliteEntryStore::new(db)), &config.vault);
    let credential = vault
        .load_credential("example.com", &km, &owner)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credential.password.expose_secret(), "p@ss");
}

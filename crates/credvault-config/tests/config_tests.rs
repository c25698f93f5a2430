// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the credvault configuration system.

use credvault_config::diagnostic::ConfigError;
use credvault_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[vault]
store_timeout_ms = 2500
recovery_timeout_ms = 10000
max_retries = 5
retry_backoff_ms = 50

[storage]
database_path = "/tmp/credvault-test.db"
wal_mode = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.vault.store_timeout_ms, 2500);
    assert_eq!(config.vault.recovery_timeout_ms, 10000);
    assert_eq!(config.vault.max_retries, 5);
    assert_eq!(config.vault.retry_backoff_ms, 50);
    assert_eq!(config.storage.database_path, "/tmp/credvault-test.db");
    assert!(!config.storage.wal_mode);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.vault.store_timeout_ms, 5_000);
    assert_eq!(config.vault.max_retries, 3);
    assert!(config.storage.wal_mode);
}

#[test]
fn unknown_vault_key_gets_suggestion() {
    let toml = "[vault]\nmax_retires = 3\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_retires");
            assert_eq!(suggestion.as_deref(), Some("max_retries"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = "[vault]\nstore_timeout_ms = \"fast\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.contains("store_timeout_ms")),
        "got {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = "[vault]\nmax_retries = 11\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "credvault.toml",
            "[vault]\nstore_timeout_ms = 1000\n[storage]\ndatabase_path = \"from-file.db\"\n",
        )?;
        jail.set_env("CREDVAULT_VAULT_STORE_TIMEOUT_MS", "4000");
        jail.set_env("CREDVAULT_STORAGE_DATABASE_PATH", "from-env.db");

        let config = load_config_from_path(std::path::Path::new("credvault.toml"))?;
        assert_eq!(config.vault.store_timeout_ms, 4000);
        assert_eq!(config.storage.database_path, "from-env.db");
        Ok(())
    });
}

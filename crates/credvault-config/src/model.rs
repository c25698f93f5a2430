// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for credvault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level credvault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CredvaultConfig {
    /// Vault lifecycle settings (timeouts, retries).
    #[serde(default)]
    pub vault: VaultConfig,

    /// Local SQLite entry store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Vault lifecycle configuration.
///
/// Every call into the remote store or the key-recovery service is bounded by
/// a timeout, and transient failures are retried with exponential backoff.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Per-call timeout for store reads and writes, in milliseconds (default: 5000).
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Timeout for a master-secret recovery round trip, in milliseconds (default: 30000).
    #[serde(default = "default_recovery_timeout_ms")]
    pub recovery_timeout_ms: u64,

    /// Retries after the first attempt of a single store operation (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between attempts, doubled each retry, in milliseconds (default: 200).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            recovery_timeout_ms: default_recovery_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_recovery_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

/// SQLite entry store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode (default: true).
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("credvault/credvault.db").display().to_string())
        .unwrap_or_else(|| "credvault.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./credvault.toml` > `~/.config/credvault/credvault.toml`
//! > `/etc/credvault/credvault.toml` with environment variable overrides via the
//! `CREDVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CredvaultConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/credvault/credvault.toml` (system-wide)
/// 3. `~/.config/credvault/credvault.toml` (user XDG config)
/// 4. `./credvault.toml` (local directory)
/// 5. `CREDVAULT_*` environment variables
pub fn load_config() -> Result<CredvaultConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CredvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CredvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CredvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CredvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CredvaultConfig::default()))
        .merge(Toml::file("/etc/credvault/credvault.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("credvault/credvault.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("credvault.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `CREDVAULT_VAULT_STORE_TIMEOUT_MS`
/// must map to `vault.store_timeout_ms`, not `vault.store.timeout.ms`.
fn env_provider() -> Env {
    Env::prefixed("CREDVAULT_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("vault_", "vault.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::CredvaultConfig;

/// Upper bound on retries after the first attempt.
const MAX_RETRIES_CEILING: u32 = 10;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CredvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let vault = &config.vault;

    if vault.store_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "vault.store_timeout_ms must be greater than zero".to_string(),
        });
    }

    if vault.recovery_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "vault.recovery_timeout_ms must be greater than zero".to_string(),
        });
    }

    if vault.max_retries > MAX_RETRIES_CEILING {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.max_retries must be at most {MAX_RETRIES_CEILING}, got {}",
                vault.max_retries
            ),
        });
    }

    if vault.retry_backoff_ms > vault.store_timeout_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "vault.retry_backoff_ms ({}) must not exceed vault.store_timeout_ms ({})",
                vault.retry_backoff_ms, vault.store_timeout_ms
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

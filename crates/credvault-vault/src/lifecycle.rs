// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault entry lifecycle against the remote store.
//!
//! Per `(owner, fingerprint)`:
//!
//! ```text
//!  NO_ENTRY --create--> LIVE --replace--> LIVE --remove--> NO_ENTRY
//! ```
//!
//! The store has no upsert primitive, so [`EntryLifecycle::upsert`] probes with
//! `exists` and then branches. The probe and the branch are not atomic: a
//! concurrent writer can land in between. The [`UpsertStep`] machine turns
//! those races into explicit transitions (duplicate create becomes replace,
//! replace of a vanished entry becomes create). A transient write failure goes
//! back to the probe, so a write is never retried blindly.
//!
//! Every store call runs under the configured timeout. Reads and idempotent
//! removes are retried with exponential backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use credvault_config::VaultConfig;
use credvault_core::{
    DomainFingerprint, EntryStore, NewEntry, OwnerId, UpsertOutcome, VaultError,
    ENTRY_NONCE_LEN, SESSION_NONCE_LEN,
};
use tracing::{debug, info, warn};

use crate::legacy::{normalize_nonce, NonceEncoding};

/// Runtime retry and timeout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Bound on every single store call.
    pub store_timeout: Duration,
    /// Attempts per operation, including the first.
    pub max_attempts: u32,
    /// Sleep before the second attempt; doubled for each further one.
    pub initial_backoff: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from(&VaultConfig::default())
    }
}

impl From<&VaultConfig> for LifecyclePolicy {
    fn from(config: &VaultConfig) -> Self {
        Self {
            store_timeout: Duration::from_millis(config.store_timeout_ms),
            max_attempts: config.max_retries.saturating_add(1),
            initial_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl LifecyclePolicy {
    /// Backoff before attempt `attempt + 1`, where `attempt` counts from 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// Where the upsert machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStep {
    /// Ask the store whether the entry exists.
    Probe,
    /// Call `create`.
    Create,
    /// Call `replace`.
    Replace,
}

/// What a step observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// `exists` answered.
    Exists(bool),
    /// `create` or `replace` committed.
    Written,
    /// `create` hit an existing entry.
    DuplicateKey,
    /// `replace` found no entry.
    NotFound,
    /// Timeout or transient store failure.
    Transient,
}

/// Next move of the upsert machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(UpsertStep),
    Done(UpsertOutcome),
    /// The step cannot produce this result; indicates a store contract violation.
    Invalid,
}

/// Pure transition function of the upsert machine.
pub fn next_step(step: UpsertStep, result: StepResult) -> Transition {
    use StepResult as R;
    use UpsertStep as S;

    match (step, result) {
        (_, R::Transient) => Transition::Next(S::Probe),
        (S::Probe, R::Exists(true)) => Transition::Next(S::Replace),
        (S::Probe, R::Exists(false)) => Transition::Next(S::Create),
        (S::Create, R::Written) => Transition::Done(UpsertOutcome::Created),
        (S::Create, R::DuplicateKey) => Transition::Next(S::Replace),
        (S::Replace, R::Written) => Transition::Done(UpsertOutcome::Replaced),
        (S::Replace, R::NotFound) => Transition::Next(S::Create),
        _ => Transition::Invalid,
    }
}

/// A fetched entry with nonces normalized to their raw form.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Ciphertext with the GCM tag appended.
    pub ciphertext: Vec<u8>,
    pub entry_nonce: [u8; ENTRY_NONCE_LEN],
    pub session_nonce: [u8; SESSION_NONCE_LEN],
    /// Unix timestamp in milliseconds from the original `create`.
    pub created_at: i64,
    /// True if either nonce was found in the legacy base64-text form.
    pub legacy_encoded: bool,
}

impl std::fmt::Debug for StoredEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredEntry")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("created_at", &self.created_at)
            .field("legacy_encoded", &self.legacy_encoded)
            .finish_non_exhaustive()
    }
}

/// Runs the check / upsert / fetch / delete protocol against an [`EntryStore`].
#[derive(Clone)]
pub struct EntryLifecycle {
    store: Arc<dyn EntryStore>,
    policy: LifecyclePolicy,
}

impl std::fmt::Debug for EntryLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryLifecycle")
            .field("store", &self.store.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl EntryLifecycle {
    pub fn new(store: Arc<dyn EntryStore>, policy: LifecyclePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Run one store call under the timeout.
    async fn bounded<T, Fut>(&self, operation: &'static str, call: Fut) -> Result<T, VaultError>
    where
        Fut: Future<Output = Result<T, VaultError>>,
    {
        match tokio::time::timeout(self.policy.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(VaultError::Timeout {
                operation,
                duration: self.policy.store_timeout,
            }),
        }
    }

    /// Run a side-effect-free (or idempotent) call with bounded retries.
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, VaultError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, VaultError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.bounded(operation, call()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        store = self.store.name(),
                        operation,
                        attempt,
                        ?delay,
                        error = %e,
                        "transient store failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => return Err(exhausted(operation, attempt, e)),
                Err(e) => return Err(e),
            }
        }
    }

    /// Read-only existence check.
    pub async fn exists(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<bool, VaultError> {
        let store = &self.store;
        self.with_retry("exists", move || store.exists(owner, fingerprint))
            .await
    }

    /// Create or replace the entry for `fingerprint`.
    ///
    /// Either the store committed `entry` (and the outcome says which branch
    /// did it) or the previous state is untouched. Dropping the future at an
    /// await point cannot leave a half-written entry because each store call
    /// is itself atomic.
    pub async fn upsert(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
        entry: &NewEntry,
    ) -> Result<UpsertOutcome, VaultError> {
        let mut step = UpsertStep::Probe;
        let mut failures = 0u32;
        let mut conflicts = 0u32;

        loop {
            let observed = match step {
                UpsertStep::Probe => self
                    .bounded("exists", self.store.exists(owner, fingerprint))
                    .await
                    .map(StepResult::Exists),
                UpsertStep::Create => self
                    .bounded("create", self.store.create(owner, fingerprint, entry))
                    .await
                    .map(|()| StepResult::Written),
                UpsertStep::Replace => self
                    .bounded("replace", self.store.replace(owner, fingerprint, entry))
                    .await
                    .map(|()| StepResult::Written),
            };

            let result = match observed {
                Ok(result) => result,
                Err(VaultError::DuplicateKey) => StepResult::DuplicateKey,
                Err(VaultError::NotFound) => StepResult::NotFound,
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if failures >= self.policy.max_attempts {
                        return Err(exhausted("upsert", failures, e));
                    }
                    let delay = self.policy.backoff(failures);
                    warn!(
                        owner = %owner,
                        fingerprint = %fingerprint.short_hex(),
                        ?step,
                        attempt = failures,
                        ?delay,
                        error = %e,
                        "transient failure during upsert, re-probing"
                    );
                    tokio::time::sleep(delay).await;
                    StepResult::Transient
                }
                Err(e) => return Err(e),
            };

            if matches!(result, StepResult::DuplicateKey | StepResult::NotFound) {
                conflicts += 1;
                debug!(
                    owner = %owner,
                    fingerprint = %fingerprint.short_hex(),
                    ?step,
                    ?result,
                    "concurrent writer detected"
                );
                if conflicts > self.policy.max_attempts {
                    return Err(VaultError::StoreUnavailable {
                        operation: "upsert",
                        attempts: conflicts,
                        message: "entry kept changing under concurrent writers".to_string(),
                    });
                }
            }

            match next_step(step, result) {
                Transition::Next(next) => step = next,
                Transition::Done(outcome) => {
                    info!(
                        store = self.store.name(),
                        owner = %owner,
                        fingerprint = %fingerprint.short_hex(),
                        %outcome,
                        "vault entry written"
                    );
                    return Ok(outcome);
                }
                Transition::Invalid => {
                    return Err(VaultError::Internal(format!(
                        "store returned {result:?} for {step:?}"
                    )));
                }
            }
        }
    }

    /// Fetch and normalize an entry, or `None` if there is none.
    pub async fn fetch(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<Option<StoredEntry>, VaultError> {
        let store = &self.store;
        let Some(record) = self
            .with_retry("fetch", move || store.fetch(owner, fingerprint))
            .await?
        else {
            return Ok(None);
        };

        let (entry_nonce, entry_encoding) = normalize_nonce(&record.entry_nonce, ENTRY_NONCE_LEN)?;
        let (session_nonce, session_encoding) =
            normalize_nonce(&record.session_nonce, SESSION_NONCE_LEN)?;
        let legacy_encoded = entry_encoding == NonceEncoding::Base64Text
            || session_encoding == NonceEncoding::Base64Text;
        if legacy_encoded {
            warn!(
                owner = %owner,
                fingerprint = %fingerprint.short_hex(),
                ?entry_encoding,
                ?session_encoding,
                "entry uses legacy nonce encoding"
            );
        }

        Ok(Some(StoredEntry {
            ciphertext: record.payload,
            entry_nonce: to_array(&entry_nonce)?,
            session_nonce: to_array(&session_nonce)?,
            created_at: record.created_at,
            legacy_encoded,
        }))
    }

    /// Remove the entry. Removing a missing entry succeeds.
    pub async fn delete(
        &self,
        owner: &OwnerId,
        fingerprint: &DomainFingerprint,
    ) -> Result<(), VaultError> {
        let store = &self.store;
        let result = self
            .with_retry("remove", move || store.remove(owner, fingerprint))
            .await;
        match result {
            Ok(()) | Err(VaultError::NotFound) => {
                debug!(
                    owner = %owner,
                    fingerprint = %fingerprint.short_hex(),
                    "vault entry removed"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Final error once transient failures used up every attempt.
fn exhausted(operation: &'static str, attempts: u32, last: VaultError) -> VaultError {
    match last {
        VaultError::Timeout { .. } => last,
        other => VaultError::StoreUnavailable {
            operation,
            attempts,
            message: other.to_string(),
        },
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], VaultError> {
    bytes
        .try_into()
        .map_err(|_| VaultError::Internal(format!("normalized nonce is not {N} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_branches_on_existence() {
        assert_eq!(
            next_step(UpsertStep::Probe, StepResult::Exists(false)),
            Transition::Next(UpsertStep::Create)
        );
        assert_eq!(
            next_step(UpsertStep::Probe, StepResult::Exists(true)),
            Transition::Next(UpsertStep::Replace)
        );
    }

    #[test]
    fn duplicate_create_becomes_replace() {
        assert_eq!(
            next_step(UpsertStep::Create, StepResult::DuplicateKey),
            Transition::Next(UpsertStep::Replace)
        );
    }

    #[test]
    fn replace_of_vanished_entry_becomes_create() {
        assert_eq!(
            next_step(UpsertStep::Replace, StepResult::NotFound),
            Transition::Next(UpsertStep::Create)
        );
    }

    #[test]
    fn writes_finish_with_matching_outcome() {
        assert_eq!(
            next_step(UpsertStep::Create, StepResult::Written),
            Transition::Done(UpsertOutcome::Created)
        );
        assert_eq!(
            next_step(UpsertStep::Replace, StepResult::Written),
            Transition::Done(UpsertOutcome::Replaced)
        );
    }

    #[test]
    fn transient_failure_always_reprobes() {
        for step in [UpsertStep::Probe, UpsertStep::Create, UpsertStep::Replace] {
            assert_eq!(
                next_step(step, StepResult::Transient),
                Transition::Next(UpsertStep::Probe)
            );
        }
    }

    #[test]
    fn impossible_results_are_invalid() {
        assert_eq!(
            next_step(UpsertStep::Probe, StepResult::Written),
            Transition::Invalid
        );
        assert_eq!(
            next_step(UpsertStep::Create, StepResult::NotFound),
            Transition::Invalid
        );
        assert_eq!(
            next_step(UpsertStep::Replace, StepResult::DuplicateKey),
            Transition::Invalid
        );
    }

    #[test]
    fn policy_from_config() {
        let policy = LifecyclePolicy::from(&VaultConfig {
            store_timeout_ms: 1500,
            recovery_timeout_ms: 1,
            max_retries: 4,
            retry_backoff_ms: 100,
        });
        assert_eq!(policy.store_timeout, Duration::from_millis(1500));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn zero_retries_means_a_single_attempt() {
        let policy = LifecyclePolicy::from(&VaultConfig {
            max_retries: 0,
            ..VaultConfig::default()
        });
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn default_config_retries_three_times_after_the_first_attempt() {
        assert_eq!(LifecyclePolicy::default().max_attempts, 4);
    }

    #[test]
    fn exhausted_keeps_timeout_distinct() {
        let timeout = VaultError::Timeout {
            operation: "fetch",
            duration: Duration::from_secs(5),
        };
        assert!(matches!(
            exhausted("fetch", 3, timeout),
            VaultError::Timeout { .. }
        ));
        let store = VaultError::store("down", std::io::Error::other("connection reset"));
        assert!(matches!(
            exhausted("fetch", 3, store),
            VaultError::StoreUnavailable { attempts: 3, .. }
        ));
    }
}

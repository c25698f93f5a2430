// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the credvault credential vault.
//!
//! Provides the error taxonomy, the shared domain types, and the two
//! collaborator traits (remote entry store, key-share service) that the vault
//! core is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Result, VaultError};
pub use traits::{EntryStore, KeyShareService};
pub use types::{
    Credential, DomainFingerprint, EntryRecord, IdentityProof, KeyShare, NewEntry, OwnerId,
    UpsertOutcome, ENTRY_NONCE_LEN, FINGERPRINT_LEN, KEY_LEN, SESSION_NONCE_LEN,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _assert_store(_: &dyn EntryStore) {}
        fn _assert_recovery(_: &dyn KeyShareService) {}
    }

    #[test]
    fn nonce_lengths_match_wire_expectations() {
        assert_eq!(ENTRY_NONCE_LEN, 12);
        assert_eq!(SESSION_NONCE_LEN, 16);
        assert_eq!(KEY_LEN, 32);
        assert_eq!(FINGERPRINT_LEN, 32);
    }
}

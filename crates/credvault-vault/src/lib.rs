// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end encrypted credential vault.
//!
//! Each credential is sealed with AES-256-GCM under a per-entry session key
//! derived from the user's master secret (KM) with HKDF-SHA-256, and filed in
//! the entry store under an HMAC-SHA-256 fingerprint of its domain. The store
//! never sees a plaintext domain, username, password, or key.

pub mod credentials;
pub mod crypto;
pub mod kdf;
pub mod legacy;
pub mod lifecycle;
pub mod recovery;
pub mod secret;
pub mod session;

pub use credentials::CredentialVault;
pub use crypto::{decrypt, encrypt, Sealed};
pub use kdf::{derive_session_key, domain_fingerprint, generate_session_nonce, normalize_domain};
pub use legacy::{normalize_nonce, NonceEncoding};
pub use lifecycle::{EntryLifecycle, LifecyclePolicy, StoredEntry, UpsertStep};
pub use recovery::{pick_canonical, MasterSecretRecovery};
pub use secret::{MasterSecret, SessionKey};
pub use session::VaultSession;

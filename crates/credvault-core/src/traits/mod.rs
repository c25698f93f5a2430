// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the vault core.
//!
//! Both traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn ...>` trait objects.

pub mod recovery;
pub mod store;

pub use recovery::KeyShareService;
pub use store::EntryStore;

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite reference entry store for credvault.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. The primary key on
//! `(owner_id, fingerprint)` gives the create-only uniqueness the vault
//! lifecycle relies on.

pub mod database;
pub mod migrations;
pub mod store;

pub use database::Database;
pub use store::SqliteEntryStore;

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for credvault integration tests.
//!
//! Provides in-process stand-ins for the two collaborators so vault behaviour
//! can be tested deterministically, including the failure modes that are hard
//! to provoke against a real backend.
//!
//! # Components
//!
//! - [`MemoryEntryStore`] - In-memory entry store with scripted faults and races
//! - [`MockKeyShareService`] - Key-share service with configurable shares

pub mod memory_store;
pub mod mock_recovery;

pub use memory_store::{Fault, MemoryEntryStore, StoreOp};
pub use mock_recovery::MockKeyShareService;

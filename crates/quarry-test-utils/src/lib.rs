// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Quarry integration tests.
//!
//! # Components
//!
//! - [`MockPluginStore`] - In-memory catalog with call recording and failure injection
//! - [`ArchiveBuilder`] - Builds plugin zip archives in memory or on disk

pub mod archive;
pub mod mock_store;

pub use archive::{corrupt_bytes, ArchiveBuilder};
pub use mock_store::MockPluginStore;

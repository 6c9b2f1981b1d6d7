// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Quarry plugin catalog.
//!
//! This crate provides the error type, the catalog entry type, and the
//! store trait shared by the storage backend, the populate pass, and the
//! lookup path.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::QuarryError;
pub use traits::PluginStore;
pub use types::PluginDescriptor;

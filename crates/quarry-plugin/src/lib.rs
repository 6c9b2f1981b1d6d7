// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin catalog synchronization for Quarry.
//!
//! A populate pass resolves the configured archive ([`source`]), walks its
//! plugin manifests ([`extract`]), parses them into descriptors
//! ([`manifest`]) and reconciles them against the catalog store
//! ([`reconcile`]). [`PluginManager`] drives the pass and serves lookups.

pub mod extract;
pub mod manager;
pub mod manifest;
pub mod reconcile;
pub mod source;

pub use manager::{LookupFn, PluginManager};
pub use manifest::{ManifestConfig, ManifestSpec, PluginStage, PluginStep};
pub use reconcile::{Outcome, ReconcileStats};

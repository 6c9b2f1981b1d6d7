// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase catalog reconciliation.
//!
//! The full catalog is loaded once into a [`CatalogIndex`]; each descriptor
//! from the archive is then compared against it and only creates or updates
//! when content differs. Per-item store failures are logged and counted,
//! never propagated.

use std::collections::HashMap;

use quarry_core::{PluginDescriptor, PluginStore, QuarryError};
use tracing::{debug, info, warn};

/// Snapshot of the catalog keyed by uid.
pub type CatalogIndex = HashMap<String, PluginDescriptor>;

/// Result of reconciling one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Updated,
    Created,
    Failed,
}

/// Counters for one populate pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// New catalog entries.
    pub created: usize,
    /// Existing entries whose content changed.
    pub updated: usize,
    /// Entries already up to date.
    pub unchanged: usize,
    /// Archive entries that did not produce a descriptor.
    pub skipped: usize,
    /// Store writes that failed.
    pub failed: usize,
}

impl ReconcileStats {
    /// Count an outcome.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Created => self.created += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// Count an archive entry that was left out before reconciliation.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }
}

/// Reconciles descriptors against a loaded catalog snapshot.
pub struct Reconciler<'a> {
    store: &'a dyn PluginStore,
    index: CatalogIndex,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn PluginStore) -> Self {
        Self {
            store,
            index: CatalogIndex::new(),
        }
    }

    /// Load the catalog snapshot. Must be called once before [`apply`](Self::apply).
    pub async fn load(&mut self) -> Result<(), QuarryError> {
        let existing = self.store.list_all().await?;
        debug!(entries = existing.len(), "loaded plugin catalog");
        self.index = existing
            .into_iter()
            .map(|plugin| (plugin.uid.clone(), plugin))
            .collect();
        Ok(())
    }

    /// Current snapshot, including writes made during this pass.
    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    /// Reconcile one descriptor read from `entry_name`.
    pub async fn apply(&mut self, plugin: PluginDescriptor, entry_name: &str) -> Outcome {
        match self.index.get(&plugin.uid) {
            Some(existing) if existing.matches(&plugin) => {
                debug!(name = entry_name, uid = %plugin.uid, "plugin unchanged");
                Outcome::Unchanged
            }
            Some(_) => match self.store.update(&plugin).await {
                Ok(()) => {
                    info!(
                        name = entry_name,
                        uid = %plugin.uid,
                        "detected changes: updated existing plugin entry"
                    );
                    self.index.insert(plugin.uid.clone(), plugin);
                    Outcome::Updated
                }
                Err(e) => {
                    warn!(name = entry_name, uid = %plugin.uid, error = %e, "could not update plugin entry");
                    Outcome::Failed
                }
            },
            None => match self.store.create(&plugin).await {
                Ok(()) => {
                    debug!(name = entry_name, uid = %plugin.uid, "created plugin entry");
                    self.index.insert(plugin.uid.clone(), plugin);
                    Outcome::Created
                }
                Err(e) => {
                    warn!(name = entry_name, uid = %plugin.uid, error = %e, "could not create plugin entry");
                    Outcome::Failed
                }
            },
        }
    }
}

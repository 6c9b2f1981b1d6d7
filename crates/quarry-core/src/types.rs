// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog entry type shared by the store and the populate pass.

use serde::{Deserialize, Serialize};

/// A single plugin as stored in the catalog.
///
/// `uid` is the catalog primary key. The remaining fields form the entry's
/// content identity: two descriptors with equal `plugin_type`, `description`,
/// `spec` and `logo` need no update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique catalog identifier (the manifest's declared name).
    pub uid: String,
    /// Declared plugin type (e.g. "step", "stage").
    pub plugin_type: String,
    /// Human-readable description taken from the manifest variant.
    pub description: String,
    /// Raw manifest text, verbatim.
    pub spec: String,
    /// Optional logo markup (typically SVG).
    pub logo: Option<String>,
}

impl PluginDescriptor {
    /// Returns true if `other` has the same content identity.
    ///
    /// Comparison is byte-exact; whitespace-only differences in `spec` count
    /// as a change.
    pub fn matches(&self, other: &PluginDescriptor) -> bool {
        self.plugin_type == other.plugin_type
            && self.description == other.description
            && self.spec == other.spec
            && self.logo == other.logo
    }
}

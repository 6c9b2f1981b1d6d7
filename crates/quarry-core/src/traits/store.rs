// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog store trait.

use async_trait::async_trait;

use crate::error::QuarryError;
use crate::types::PluginDescriptor;

/// Persistent catalog of plugin descriptors, addressed by uid.
///
/// The populate pass and the lookup path only ever touch the catalog through
/// this trait. Cancelling a call means dropping its future.
#[async_trait]
pub trait PluginStore: Send + Sync {
    /// Returns every descriptor in the catalog.
    async fn list_all(&self) -> Result<Vec<PluginDescriptor>, QuarryError>;

    /// Finds a descriptor by uid and version.
    ///
    /// Fails with [`QuarryError::NotFound`] when no entry matches.
    async fn find(&self, uid: &str, version: &str) -> Result<PluginDescriptor, QuarryError>;

    /// Inserts a new descriptor.
    ///
    /// Fails with [`QuarryError::AlreadyExists`] if the uid is taken.
    async fn create(&self, plugin: &PluginDescriptor) -> Result<(), QuarryError>;

    /// Replaces an existing descriptor.
    ///
    /// Fails with [`QuarryError::NotFound`] if the uid is absent.
    async fn update(&self, plugin: &PluginDescriptor) -> Result<(), QuarryError>;
}

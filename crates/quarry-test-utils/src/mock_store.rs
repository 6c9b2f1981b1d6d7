// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugin store for deterministic testing.
//!
//! `MockPluginStore` implements `PluginStore` over an in-memory map, counts
//! every call, and can be told to fail specific operations.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use quarry_core::{PluginDescriptor, PluginStore, QuarryError};

#[derive(Debug, Default)]
struct Calls {
    list_all: usize,
    find: Vec<(String, String)>,
    create: Vec<String>,
    update: Vec<String>,
}

#[derive(Debug, Default)]
struct Failures {
    list_all: bool,
    find: bool,
    create: HashSet<String>,
    update: HashSet<String>,
}

/// An in-memory catalog that records calls.
///
/// Clones share state, so a test can keep one handle while the code under
/// test owns another.
#[derive(Clone, Default)]
pub struct MockPluginStore {
    plugins: Arc<Mutex<BTreeMap<String, PluginDescriptor>>>,
    calls: Arc<Mutex<Calls>>,
    failures: Arc<Mutex<Failures>>,
}

impl MockPluginStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given entries.
    pub fn with_plugins(plugins: Vec<PluginDescriptor>) -> Self {
        let map = plugins.into_iter().map(|p| (p.uid.clone(), p)).collect();
        Self {
            plugins: Arc::new(Mutex::new(map)),
            ..Self::default()
        }
    }

    /// Get a stored entry without recording a call.
    pub async fn get(&self, uid: &str) -> Option<PluginDescriptor> {
        self.plugins.lock().await.get(uid).cloned()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.plugins.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plugins.lock().await.is_empty()
    }

    pub async fn list_all_calls(&self) -> usize {
        self.calls.lock().await.list_all
    }

    pub async fn find_calls(&self) -> usize {
        self.calls.lock().await.find.len()
    }

    pub async fn create_calls(&self) -> usize {
        self.calls.lock().await.create.len()
    }

    pub async fn update_calls(&self) -> usize {
        self.calls.lock().await.update.len()
    }

    /// Uids passed to `create`, in call order.
    pub async fn created_uids(&self) -> Vec<String> {
        self.calls.lock().await.create.clone()
    }

    /// Uids passed to `update`, in call order.
    pub async fn updated_uids(&self) -> Vec<String> {
        self.calls.lock().await.update.clone()
    }

    /// `(uid, version)` pairs passed to `find`, in call order.
    pub async fn find_queries(&self) -> Vec<(String, String)> {
        self.calls.lock().await.find.clone()
    }

    /// Total number of store calls of any kind.
    pub async fn total_calls(&self) -> usize {
        let calls = self.calls.lock().await;
        calls.list_all + calls.find.len() + calls.create.len() + calls.update.len()
    }

    /// Reset call counters, keeping stored entries.
    pub async fn clear_calls(&self) {
        *self.calls.lock().await = Calls::default();
    }

    /// Make every `list_all` fail.
    pub async fn fail_list_all(&self) {
        self.failures.lock().await.list_all = true;
    }

    /// Make every `find` fail with a storage error.
    pub async fn fail_find(&self) {
        self.failures.lock().await.find = true;
    }

    /// Make `create` fail for `uid`.
    pub async fn fail_create(&self, uid: &str) {
        self.failures.lock().await.create.insert(uid.to_string());
    }

    /// Make `update` fail for `uid`.
    pub async fn fail_update(&self, uid: &str) {
        self.failures.lock().await.update.insert(uid.to_string());
    }
}

fn injected(op: &str) -> QuarryError {
    QuarryError::Storage {
        source: format!("injected {op} failure").into(),
    }
}

#[async_trait]
impl PluginStore for MockPluginStore {
    async fn list_all(&self) -> Result<Vec<PluginDescriptor>, QuarryError> {
        self.calls.lock().await.list_all += 1;
        if self.failures.lock().await.list_all {
            return Err(injected("list_all"));
        }
        Ok(self.plugins.lock().await.values().cloned().collect())
    }

    async fn find(&self, uid: &str, version: &str) -> Result<PluginDescriptor, QuarryError> {
        self.calls
            .lock()
            .await
            .find
            .push((uid.to_string(), version.to_string()));
        if self.failures.lock().await.find {
            return Err(injected("find"));
        }
        self.get(uid).await.ok_or_else(|| QuarryError::NotFound {
            uid: uid.to_string(),
        })
    }

    async fn create(&self, plugin: &PluginDescriptor) -> Result<(), QuarryError> {
        self.calls.lock().await.create.push(plugin.uid.clone());
        if self.failures.lock().await.create.contains(&plugin.uid) {
            return Err(injected("create"));
        }
        let mut plugins = self.plugins.lock().await;
        if plugins.contains_key(&plugin.uid) {
            return Err(QuarryError::AlreadyExists {
                uid: plugin.uid.clone(),
            });
        }
        plugins.insert(plugin.uid.clone(), plugin.clone());
        Ok(())
    }

    async fn update(&self, plugin: &PluginDescriptor) -> Result<(), QuarryError> {
        self.calls.lock().await.update.push(plugin.uid.clone());
        if self.failures.lock().await.update.contains(&plugin.uid) {
            return Err(injected("update"));
        }
        let mut plugins = self.plugins.lock().await;
        match plugins.get_mut(&plugin.uid) {
            Some(existing) => {
                *existing = plugin.clone();
                Ok(())
            }
            None => Err(QuarryError::NotFound {
                uid: plugin.uid.clone(),
            }),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the PluginStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use quarry_config::model::StorageConfig;
use quarry_core::{PluginDescriptor, PluginStore, QuarryError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed plugin catalog.
///
/// Wraps a [`Database`] handle and delegates to the typed query module. The
/// database is lazily opened on the first call to [`SqlitePluginStore::initialize`].
pub struct SqlitePluginStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqlitePluginStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Opens the database and applies migrations.
    pub async fn initialize(&self) -> Result<(), QuarryError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| QuarryError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite plugin store initialized");
        Ok(())
    }

    /// Checkpoints the WAL before shutdown.
    pub async fn close(&self) -> Result<(), QuarryError> {
        if self.config.wal_mode {
            self.db()?.checkpoint().await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    fn db(&self) -> Result<&Database, QuarryError> {
        self.db.get().ok_or_else(|| QuarryError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginStore for SqlitePluginStore {
    async fn list_all(&self) -> Result<Vec<PluginDescriptor>, QuarryError> {
        queries::plugins::list_plugins(self.db()?).await
    }

    async fn find(&self, uid: &str, version: &str) -> Result<PluginDescriptor, QuarryError> {
        // One live manifest per uid; the version is accepted but not stored.
        if !version.is_empty() {
            debug!(uid, version, "resolving plugin by uid only");
        }
        queries::plugins::get_plugin(self.db()?, uid)
            .await?
            .ok_or_else(|| QuarryError::NotFound {
                uid: uid.to_string(),
            })
    }

    async fn create(&self, plugin: &PluginDescriptor) -> Result<(), QuarryError> {
        if queries::plugins::insert_plugin(self.db()?, plugin).await? {
            Ok(())
        } else {
            Err(QuarryError::AlreadyExists {
                uid: plugin.uid.clone(),
            })
        }
    }

    async fn update(&self, plugin: &PluginDescriptor) -> Result<(), QuarryError> {
        match queries::plugins::update_plugin(self.db()?, plugin).await? {
            0 => Err(QuarryError::NotFound {
                uid: plugin.uid.clone(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(uid: &str, spec: &str) -> PluginDescriptor {
        PluginDescriptor {
            uid: uid.to_string(),
            plugin_type: "step".to_string(),
            description: String::new(),
            spec: spec.to_string(),
            logo: None,
        }
    }

    async fn memory_store() -> SqlitePluginStore {
        SqlitePluginStore::from_database(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn uninitialized_store_errors() {
        let store = SqlitePluginStore::new(StorageConfig::default());
        let err = store.list_all().await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn initialize_twice_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqlitePluginStore::new(StorageConfig {
            database_path: dir.path().join("q.db").display().to_string(),
            wal_mode: true,
        });
        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn create_then_create_again_is_already_exists() {
        let store = memory_store().await;
        store.create(&plugin("docker", "a")).await.unwrap();
        let err = store.create(&plugin("docker", "a")).await.unwrap_err();
        assert!(matches!(err, QuarryError::AlreadyExists { uid } if uid == "docker"));
    }

    #[tokio::test]
    async fn update_absent_is_not_found() {
        let store = memory_store().await;
        let err = store.update(&plugin("docker", "a")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn find_ignores_version() {
        let store = memory_store().await;
        store.create(&plugin("docker", "a")).await.unwrap();
        assert_eq!(store.find("docker", "").await.unwrap().spec, "a");
        assert_eq!(store.find("docker", "1.2.0").await.unwrap().spec, "a");
        assert!(store.find("slack", "").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_then_list_reflects_change() {
        let store = memory_store().await;
        store.create(&plugin("docker", "a")).await.unwrap();
        store.update(&plugin("docker", "b")).await.unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].spec, "b");
    }
}

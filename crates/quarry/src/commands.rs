// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `quarry populate` and `quarry lookup`.

use std::sync::Arc;

use quarry_config::model::StorageConfig;
use quarry_config::QuarryConfig;
use quarry_core::{PluginStore, QuarryError};
use quarry_plugin::{ManifestConfig, PluginManager, ReconcileStats};
use quarry_storage::SqlitePluginStore;
use tracing::info;

async fn open_store(config: &StorageConfig) -> Result<Arc<SqlitePluginStore>, QuarryError> {
    let store = Arc::new(SqlitePluginStore::new(config.clone()));
    store.initialize().await?;
    Ok(store)
}

/// Run one populate pass and print its summary.
pub async fn populate(config: QuarryConfig) -> Result<(), QuarryError> {
    let store = open_store(&config.storage).await?;
    let stats = run_populate(config, Arc::clone(&store) as Arc<dyn PluginStore>).await;
    store.close().await?;

    let stats = stats?;
    println!("{}", format_stats(&stats));
    Ok(())
}

async fn run_populate(
    config: QuarryConfig,
    store: Arc<dyn PluginStore>,
) -> Result<ReconcileStats, QuarryError> {
    let manager = PluginManager::new(config.catalog, store)?;
    let stats = manager.populate().await?;
    info!(created = stats.created, updated = stats.updated, "catalog synchronized");
    Ok(stats)
}

/// Print the stored manifest for `name` as YAML.
pub async fn lookup(
    config: QuarryConfig,
    name: &str,
    kind: &str,
    plugin_type: &str,
    version: &str,
) -> Result<(), QuarryError> {
    let store = open_store(&config.storage).await?;
    let manager = PluginManager::new(config.catalog, Arc::clone(&store) as Arc<dyn PluginStore>)?;
    let manifest = manager.lookup(name, kind, plugin_type, version).await;
    store.close().await?;

    print!("{}", render_manifest(&manifest?)?);
    Ok(())
}

fn format_stats(stats: &ReconcileStats) -> String {
    format!(
        "created: {}, updated: {}, unchanged: {}, skipped: {}, failed: {}",
        stats.created, stats.updated, stats.unchanged, stats.skipped, stats.failed
    )
}

fn render_manifest(manifest: &ManifestConfig) -> Result<String, QuarryError> {
    serde_yaml::to_string(manifest)
        .map_err(|e| QuarryError::Internal(format!("could not render manifest: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_test_utils::ArchiveBuilder;

    const DOCKER: &str = "kind: plugin
type: step
name: docker
spec:
  description: Build and publish Docker images
  image: plugins/docker
";

    fn config_in(dir: &tempfile::TempDir, archive: Option<String>) -> QuarryConfig {
        let mut config = quarry_config::load_and_validate_str("").unwrap();
        config.storage.database_path = dir.path().join("catalog.db").display().to_string();
        config.catalog.archive_path = archive;
        config
    }

    #[test]
    fn stats_summary_lists_every_counter() {
        let stats = ReconcileStats {
            created: 2,
            updated: 1,
            unchanged: 4,
            skipped: 1,
            failed: 0,
        };
        assert_eq!(
            format_stats(&stats),
            "created: 2, updated: 1, unchanged: 4, skipped: 1, failed: 0"
        );
    }

    #[tokio::test]
    async fn populate_then_lookup_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ArchiveBuilder::new()
            .manifest("", "docker", DOCKER)
            .into_temp_file();
        let config = config_in(&dir, Some(archive.path().display().to_string()));

        populate(config.clone()).await.unwrap();

        let store = open_store(&config.storage).await.unwrap();
        let manager = PluginManager::new(config.catalog.clone(), store.clone()).unwrap();
        let manifest = manager.lookup("docker", "plugin", "step", "").await.unwrap();
        store.close().await.unwrap();

        let yaml = render_manifest(&manifest).unwrap();
        assert!(yaml.contains("name: docker"));
        assert!(yaml.contains("image: plugins/docker"));
    }

    #[tokio::test]
    async fn populate_without_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = populate(config_in(&dir, None)).await.unwrap_err();
        assert!(matches!(err, QuarryError::Config(_)));
    }

    #[tokio::test]
    async fn lookup_unknown_plugin_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = lookup(config_in(&dir, None), "ghost", "plugin", "step", "")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}

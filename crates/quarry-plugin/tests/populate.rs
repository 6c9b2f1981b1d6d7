// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end populate pass tests against mock and SQLite stores.

use std::sync::Arc;
use std::time::Duration;

use quarry_config::model::CatalogConfig;
use quarry_core::{PluginDescriptor, PluginStore, QuarryError};
use quarry_plugin::{ManifestSpec, PluginManager, ReconcileStats};
use quarry_storage::{Database, SqlitePluginStore};
use quarry_test_utils::{ArchiveBuilder, MockPluginStore};
use tempfile::NamedTempFile;
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCKER_S1: &str = "kind: plugin
type: step
name: docker
spec:
  description: Build and publish Docker images
  image: plugins/docker
";

const DOCKER_S2: &str = "kind: plugin
type: step
name: docker
spec:
  description: Build and publish Docker images
  image: plugins/docker:2
";

const SLACK: &str = "version: 1
kind: plugin
type: stage
name: slack
spec:
  description: Notify a Slack channel
  stages:
    - name: notify
";

const BROKEN: &str = "kind: plugin
type: step
name: [broken
";

const PIPELINE: &str = "kind: pipeline
type: docker
name: ci
";

fn manager_for(archive: &NamedTempFile, store: Arc<dyn PluginStore>) -> PluginManager {
    let config = CatalogConfig {
        archive_path: Some(archive.path().display().to_string()),
        ..CatalogConfig::default()
    };
    PluginManager::new(config, store).unwrap()
}

fn mock_manager(archive: &NamedTempFile, store: &MockPluginStore) -> PluginManager {
    manager_for(archive, Arc::new(store.clone()))
}

#[tokio::test]
async fn second_pass_is_idempotent() {
    let archive = ArchiveBuilder::new()
        .manifest("bundle", "docker", DOCKER_S1)
        .manifest("bundle", "slack", SLACK)
        .into_temp_file();
    let store = MockPluginStore::new();
    let manager = mock_manager(&archive, &store);

    let first = manager.populate().await.unwrap();
    assert_eq!(first.created, 2);
    assert_eq!(store.len().await, 2);

    store.clear_calls().await;
    let second = manager.populate().await.unwrap();
    assert_eq!(
        second,
        ReconcileStats {
            unchanged: 2,
            ..ReconcileStats::default()
        }
    );
    assert_eq!(store.list_all_calls().await, 1);
    assert_eq!(store.create_calls().await, 0);
    assert_eq!(store.update_calls().await, 0);
}

#[tokio::test]
#[traced_test]
async fn broken_manifest_is_skipped_and_logged() {
    let archive = ArchiveBuilder::new()
        .manifest("", "broken", BROKEN)
        .manifest("", "docker", DOCKER_S1)
        .into_temp_file();
    let store = MockPluginStore::new();

    let stats = mock_manager(&archive, &store).populate().await.unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(store.created_uids().await, vec!["docker".to_string()]);

    assert!(logs_contain("plugins/broken/plugin.yaml"));
    assert!(logs_contain("added 1 new entries to plugins"));
}

#[tokio::test]
#[traced_test]
async fn changed_manifest_is_updated_not_added() {
    let store = MockPluginStore::new();
    let s1 = ArchiveBuilder::new().manifest("", "docker", DOCKER_S1).into_temp_file();
    mock_manager(&s1, &store).populate().await.unwrap();
    store.clear_calls().await;

    let s2 = ArchiveBuilder::new().manifest("", "docker", DOCKER_S2).into_temp_file();
    let stats = mock_manager(&s2, &store).populate().await.unwrap();

    assert_eq!(stats.created, 0);
    assert_eq!(stats.updated, 1);
    assert_eq!(store.updated_uids().await, vec!["docker".to_string()]);
    assert_eq!(store.create_calls().await, 0);
    assert_eq!(store.get("docker").await.unwrap().spec, DOCKER_S2);
    assert!(logs_contain("detected changes: updated existing plugin entry"));
    assert!(logs_contain("added 0 new entries to plugins"));
}

#[tokio::test]
async fn new_manifest_is_created_once() {
    let store = MockPluginStore::with_plugins(vec![PluginDescriptor {
        uid: "slack".to_string(),
        plugin_type: "stage".to_string(),
        description: "Notify a Slack channel".to_string(),
        spec: SLACK.to_string(),
        logo: None,
    }]);
    let archive = ArchiveBuilder::new()
        .manifest("", "slack", SLACK)
        .manifest("", "docker", DOCKER_S1)
        .into_temp_file();

    let stats = mock_manager(&archive, &store).populate().await.unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.unchanged, 1);
    assert_eq!(store.create_calls().await, 1);
    assert_eq!(store.update_calls().await, 0);

    let docker = store.get("docker").await.unwrap();
    assert_eq!(docker.plugin_type, "step");
    assert_eq!(docker.description, "Build and publish Docker images");
    assert_eq!(docker.spec, DOCKER_S1);
}

#[tokio::test]
async fn unsupported_and_non_utf8_entries_are_skipped() {
    let archive = ArchiveBuilder::new()
        .manifest("", "ci", PIPELINE)
        .file("plugins/binary/plugin.yaml", [0xff_u8, 0xfe, 0x00])
        .file("plugins/docker/readme.md", "not a manifest")
        .manifest("", "docker", DOCKER_S1)
        .into_temp_file();
    let store = MockPluginStore::new();

    let stats = mock_manager(&archive, &store).populate().await.unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.skipped, 2);
    assert!(store.get("ci").await.is_none());
}

#[tokio::test]
async fn duplicate_uid_in_archive_is_created_once() {
    let archive = ArchiveBuilder::new()
        .manifest("a", "docker", DOCKER_S1)
        .manifest("b", "docker", DOCKER_S1)
        .into_temp_file();
    let store = MockPluginStore::new();

    let stats = mock_manager(&archive, &store).populate().await.unwrap();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.unchanged, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(store.create_calls().await, 1);
}

#[tokio::test]
#[traced_test]
async fn write_failures_do_not_abort_the_pass() {
    let archive = ArchiveBuilder::new()
        .manifest("", "docker", DOCKER_S1)
        .manifest("", "slack", SLACK)
        .into_temp_file();
    let store = MockPluginStore::new();
    store.fail_create("docker").await;

    let stats = mock_manager(&archive, &store).populate().await.unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.created, 1);
    assert!(store.get("slack").await.is_some());
    assert!(logs_contain("could not create plugin entry"));
}

#[tokio::test]
async fn logo_is_attached_and_tracked() {
    let store = MockPluginStore::new();

    let first = ArchiveBuilder::new()
        .manifest("", "docker", DOCKER_S1)
        .file("plugins/docker/logo.svg", "<svg>v1</svg>")
        .into_temp_file();
    mock_manager(&first, &store).populate().await.unwrap();
    assert_eq!(
        store.get("docker").await.unwrap().logo.as_deref(),
        Some("<svg>v1</svg>")
    );

    let second = ArchiveBuilder::new()
        .manifest("", "docker", DOCKER_S1)
        .file("plugins/docker/logo.svg", "<svg>v2</svg>")
        .into_temp_file();
    let stats = mock_manager(&second, &store).populate().await.unwrap();
    assert_eq!(stats.updated, 1);
    assert_eq!(
        store.get("docker").await.unwrap().logo.as_deref(),
        Some("<svg>v2</svg>")
    );
}

#[tokio::test]
async fn catalog_load_failure_is_fatal() {
    let archive = ArchiveBuilder::new()
        .manifest("", "docker", DOCKER_S1)
        .into_temp_file();
    let store = MockPluginStore::new();
    store.fail_list_all().await;

    let err = mock_manager(&archive, &store).populate().await.unwrap_err();
    assert!(matches!(err, QuarryError::Storage { .. }));
    assert_eq!(store.create_calls().await, 0);
}

#[tokio::test]
async fn invalid_archive_is_fatal_before_store_access() {
    let archive = NamedTempFile::new().unwrap();
    std::fs::write(archive.path(), "this is not a zip").unwrap();
    let store = MockPluginStore::new();

    let err = mock_manager(&archive, &store).populate().await.unwrap_err();
    assert!(matches!(err, QuarryError::Archive { .. }));
    assert_eq!(store.total_calls().await, 0);
}

#[tokio::test]
async fn remote_archive_is_downloaded_and_ingested() {
    let server = MockServer::start().await;
    let bytes = ArchiveBuilder::new()
        .manifest("drone-plugins-main", "docker", DOCKER_S1)
        .to_bytes();
    Mock::given(method("GET"))
        .and(path("/plugins.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .expect(1)
        .mount(&server)
        .await;

    let store = MockPluginStore::new();
    let config = CatalogConfig {
        archive_path: Some(format!("{}/plugins.zip", server.uri())),
        ..CatalogConfig::default()
    };
    let manager = PluginManager::new(config, Arc::new(store.clone())).unwrap();

    let stats = manager.populate().await.unwrap();
    assert_eq!(stats.created, 1);
    assert!(store.get("docker").await.is_some());
}

#[tokio::test]
async fn remote_failure_is_fatal_before_store_access() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = MockPluginStore::new();
    let config = CatalogConfig {
        archive_path: Some(format!("{}/plugins.zip", server.uri())),
        ..CatalogConfig::default()
    };
    let err = PluginManager::new(config, Arc::new(store.clone()))
        .unwrap()
        .populate()
        .await
        .unwrap_err();
    assert!(matches!(err, QuarryError::Transport { .. }));
    assert_eq!(store.total_calls().await, 0);
}

#[tokio::test]
async fn pass_can_be_cancelled_with_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let store = MockPluginStore::new();
    let config = CatalogConfig {
        archive_path: Some(format!("{}/plugins.zip", server.uri())),
        ..CatalogConfig::default()
    };
    let manager = PluginManager::new(config, Arc::new(store.clone())).unwrap();

    let result = tokio::time::timeout(Duration::from_millis(200), manager.populate()).await;
    assert!(result.is_err(), "pass should have been cancelled");
    assert_eq!(store.total_calls().await, 0);
}

#[tokio::test]
async fn sqlite_catalog_end_to_end() {
    let db = Database::open_in_memory().await.unwrap();
    let store: Arc<dyn PluginStore> = Arc::new(SqlitePluginStore::from_database(db));

    let s1 = ArchiveBuilder::new()
        .manifest("", "docker", DOCKER_S1)
        .manifest("", "slack", SLACK)
        .file("plugins/slack/logo.svg", "<svg/>")
        .into_temp_file();
    let manager = manager_for(&s1, Arc::clone(&store));
    assert_eq!(manager.populate().await.unwrap().created, 2);
    assert_eq!(manager.populate().await.unwrap().unchanged, 2);

    let s2 = ArchiveBuilder::new()
        .manifest("", "docker", DOCKER_S2)
        .into_temp_file();
    let stats = manager_for(&s2, Arc::clone(&store)).populate().await.unwrap();
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.created, 0);

    // Entries missing from the newer archive are kept.
    let slack = store.find("slack", "").await.unwrap();
    assert_eq!(slack.logo.as_deref(), Some("<svg/>"));

    let docker = manager.lookup("docker", "plugin", "step", "").await.unwrap();
    match docker.spec {
        ManifestSpec::PluginStep(step) => {
            assert_eq!(step.image.as_deref(), Some("plugins/docker:2"));
        }
        other => panic!("unexpected variant: {other:?}"),
    }

    let lookup = manager.lookup_fn();
    let err = lookup("ghost", "plugin", "step", "").await.unwrap_err();
    assert!(err.is_not_found());
}

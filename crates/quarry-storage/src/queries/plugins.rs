// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin catalog CRUD operations.

use chrono::Utc;
use quarry_core::{PluginDescriptor, QuarryError};
use rusqlite::{params, Row};

use crate::database::{map_tr_err, Database};

const PLUGIN_COLUMNS: &str =
    "plugin_uid, plugin_type, plugin_description, plugin_spec, plugin_logo";

fn map_row(row: &Row<'_>) -> rusqlite::Result<PluginDescriptor> {
    Ok(PluginDescriptor {
        uid: row.get(0)?,
        plugin_type: row.get(1)?,
        description: row.get(2)?,
        spec: row.get(3)?,
        logo: row.get(4)?,
    })
}

/// List every plugin, ordered by uid.
pub async fn list_plugins(db: &Database) -> Result<Vec<PluginDescriptor>, QuarryError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<PluginDescriptor>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLUGIN_COLUMNS} FROM plugins ORDER BY plugin_uid"
            ))?;
            let plugins = stmt
                .query_map([], map_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(plugins)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a plugin by uid.
pub async fn get_plugin(db: &Database, uid: &str) -> Result<Option<PluginDescriptor>, QuarryError> {
    let uid = uid.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<PluginDescriptor>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLUGIN_COLUMNS} FROM plugins WHERE plugin_uid = ?1"
            ))?;
            match stmt.query_row(params![uid], map_row) {
                Ok(plugin) => Ok(Some(plugin)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new plugin.
///
/// Returns `Ok(false)` without writing when the uid already exists.
pub async fn insert_plugin(db: &Database, plugin: &PluginDescriptor) -> Result<bool, QuarryError> {
    let plugin = plugin.clone();
    let now = Utc::now().timestamp_millis();
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let result = conn.execute(
                "INSERT INTO plugins
                 (plugin_uid, plugin_type, plugin_description, plugin_spec, plugin_logo,
                  plugin_created, plugin_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    plugin.uid,
                    plugin.plugin_type,
                    plugin.description,
                    plugin.spec,
                    plugin.logo,
                    now,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the content of an existing plugin.
///
/// Returns the number of rows changed (0 when the uid is absent).
pub async fn update_plugin(db: &Database, plugin: &PluginDescriptor) -> Result<usize, QuarryError> {
    let plugin = plugin.clone();
    let now = Utc::now().timestamp_millis();
    db.connection()
        .call(move |conn| -> rusqlite::Result<usize> {
            conn.execute(
                "UPDATE plugins
                 SET plugin_type = ?2, plugin_description = ?3, plugin_spec = ?4,
                     plugin_logo = ?5, plugin_updated = ?6
                 WHERE plugin_uid = ?1",
                params![
                    plugin.uid,
                    plugin.plugin_type,
                    plugin.description,
                    plugin.spec,
                    plugin.logo,
                    now,
                ],
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(uid: &str, spec: &str) -> PluginDescriptor {
        PluginDescriptor {
            uid: uid.to_string(),
            plugin_type: "step".to_string(),
            description: format!("{uid} plugin"),
            spec: spec.to_string(),
            logo: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let db = Database::open_in_memory().await.unwrap();
        let mut docker = plugin("docker", "kind: plugin\n");
        docker.logo = Some("<svg/>".to_string());

        assert!(insert_plugin(&db, &docker).await.unwrap());
        let stored = get_plugin(&db, "docker").await.unwrap().unwrap();
        assert_eq!(stored, docker);
    }

    #[tokio::test]
    async fn insert_duplicate_returns_false() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(insert_plugin(&db, &plugin("docker", "a")).await.unwrap());
        assert!(!insert_plugin(&db, &plugin("docker", "b")).await.unwrap());

        // The first write is kept.
        let stored = get_plugin(&db, "docker").await.unwrap().unwrap();
        assert_eq!(stored.spec, "a");
    }

    #[tokio::test]
    async fn update_missing_changes_nothing() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(update_plugin(&db, &plugin("ghost", "x")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_overwrites_content() {
        let db = Database::open_in_memory().await.unwrap();
        insert_plugin(&db, &plugin("docker", "v1")).await.unwrap();

        let mut changed = plugin("docker", "v2");
        changed.logo = Some("<svg/>".to_string());
        assert_eq!(update_plugin(&db, &changed).await.unwrap(), 1);

        let stored = get_plugin(&db, "docker").await.unwrap().unwrap();
        assert_eq!(stored, changed);
    }

    #[tokio::test]
    async fn list_is_sorted_by_uid() {
        let db = Database::open_in_memory().await.unwrap();
        insert_plugin(&db, &plugin("slack", "s")).await.unwrap();
        insert_plugin(&db, &plugin("docker", "d")).await.unwrap();

        let all = list_plugins(&db).await.unwrap();
        let uids: Vec<&str> = all.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["docker", "slack"]);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(get_plugin(&db, "nope").await.unwrap().is_none());
    }
}

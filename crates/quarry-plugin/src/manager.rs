// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin catalog manager: the populate pass and manifest lookup.

use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use quarry_config::model::CatalogConfig;
use quarry_core::{PluginDescriptor, PluginStore, QuarryError};
use reqwest::Client;
use tracing::{debug, info, warn, Span};

use crate::extract::{open_archive, ExtractedManifest, ManifestEntries};
use crate::manifest::{descriptor_from_manifest, parse_manifest, ManifestConfig};
use crate::reconcile::{ReconcileStats, Reconciler};
use crate::source::{build_http_client, resolve};

/// Resolves `(name, kind, type, version)` to a stored manifest.
///
/// Handed to external resolvers that need manifests without holding a
/// [`PluginManager`].
pub type LookupFn = Arc<
    dyn Fn(&str, &str, &str, &str) -> BoxFuture<'static, Result<ManifestConfig, QuarryError>>
        + Send
        + Sync,
>;

/// Owns the catalog store and the archive settings.
pub struct PluginManager {
    config: CatalogConfig,
    store: Arc<dyn PluginStore>,
    client: Client,
}

impl PluginManager {
    /// Create a manager, building its HTTP client from `config`.
    pub fn new(config: CatalogConfig, store: Arc<dyn PluginStore>) -> Result<Self, QuarryError> {
        let client = build_http_client(&config)?;
        Ok(Self {
            config,
            store,
            client,
        })
    }

    /// Run one populate pass against the configured archive.
    ///
    /// Writes committed before a fatal error stay committed.
    pub async fn populate(&self) -> Result<ReconcileStats, QuarryError> {
        let location = self
            .config
            .archive_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                QuarryError::Config("plugins path not provided to read schemas from".to_string())
            })?;

        let resolved = resolve(location, &self.client).await?;
        let archive_path = resolved.path().to_path_buf();

        // Archive reads and YAML parsing are synchronous.
        let span = Span::current();
        let parsed = tokio::task::spawn_blocking(move || {
            span.in_scope(|| parse_archive(&archive_path))
        })
        .await
        .map_err(|e| QuarryError::Internal(format!("manifest extraction task failed: {e}")))??;
        drop(resolved);

        let mut reconciler = Reconciler::new(self.store.as_ref());
        reconciler.load().await?;

        let mut stats = ReconcileStats::default();
        for entry in parsed {
            match entry {
                ParsedEntry::Plugin { entry_name, plugin } => {
                    stats.record(reconciler.apply(plugin, &entry_name).await);
                }
                ParsedEntry::Skipped => stats.record_skip(),
            }
        }

        info!("added {} new entries to plugins", stats.created);
        debug!(
            updated = stats.updated,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            failed = stats.failed,
            "populate pass complete"
        );
        Ok(stats)
    }

    /// Look up the stored manifest for a step plugin.
    pub async fn lookup(
        &self,
        name: &str,
        kind: &str,
        plugin_type: &str,
        version: &str,
    ) -> Result<ManifestConfig, QuarryError> {
        lookup_in(self.store.as_ref(), name, kind, plugin_type, version).await
    }

    /// A cloneable lookup closure sharing this manager's store.
    pub fn lookup_fn(&self) -> LookupFn {
        let store = Arc::clone(&self.store);
        Arc::new(
            move |name: &str,
                  kind: &str,
                  plugin_type: &str,
                  version: &str|
                  -> BoxFuture<'static, Result<ManifestConfig, QuarryError>> {
                let store = Arc::clone(&store);
                let name = name.to_string();
                let kind = kind.to_string();
                let plugin_type = plugin_type.to_string();
                let version = version.to_string();
                Box::pin(async move {
                    lookup_in(store.as_ref(), &name, &kind, &plugin_type, &version).await
                })
            },
        )
    }
}

enum ParsedEntry {
    Plugin {
        entry_name: String,
        plugin: PluginDescriptor,
    },
    Skipped,
}

/// Extract and parse every manifest in the archive at `path`, in archive order.
fn parse_archive(path: &Path) -> Result<Vec<ParsedEntry>, QuarryError> {
    let mut archive = open_archive(path)?;
    let entries = ManifestEntries::new(&mut archive)?;

    Ok(entries
        .map(|entry| {
            let ExtractedManifest {
                entry_name,
                manifest,
                logo,
            } = entry;

            let mut plugin = match descriptor_from_manifest(&manifest) {
                Ok(plugin) => plugin,
                Err(skip) => {
                    warn!(name = %entry_name, error = %skip, "skipping plugin manifest");
                    return ParsedEntry::Skipped;
                }
            };
            plugin.logo = logo.and_then(|bytes| match String::from_utf8(bytes) {
                Ok(svg) => Some(svg),
                Err(e) => {
                    warn!(name = %entry_name, error = %e, "logo is not valid UTF-8, ignoring");
                    None
                }
            });
            ParsedEntry::Plugin { entry_name, plugin }
        })
        .collect())
}

async fn lookup_in(
    store: &dyn PluginStore,
    name: &str,
    kind: &str,
    plugin_type: &str,
    version: &str,
) -> Result<ManifestConfig, QuarryError> {
    if kind != "plugin" {
        return Err(QuarryError::UnsupportedQuery(
            "only plugin kind supported".to_string(),
        ));
    }
    if plugin_type != "step" {
        return Err(QuarryError::UnsupportedQuery(
            "only step plugins supported".to_string(),
        ));
    }

    let plugin = store
        .find(name, version)
        .await
        .map_err(|e| QuarryError::Lookup {
            name: name.to_string(),
            source: Box::new(e),
        })?;
    parse_manifest(&plugin.spec)
}

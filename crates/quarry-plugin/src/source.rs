// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves the configured archive location to a readable local file.
//!
//! A location naming an existing local file is used as-is. Anything else is
//! treated as a URL and downloaded into a temporary file that is deleted when
//! the returned [`ResolvedArchive`] is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use quarry_config::model::CatalogConfig;
use quarry_core::QuarryError;
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// A local archive ready to be opened.
#[derive(Debug)]
pub enum ResolvedArchive {
    /// The configured location already existed on disk.
    Local(PathBuf),
    /// The archive was downloaded; the file is removed on drop.
    Downloaded(NamedTempFile),
}

impl ResolvedArchive {
    /// Path of the local archive file.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedArchive::Local(path) => path,
            ResolvedArchive::Downloaded(file) => file.path(),
        }
    }
}

/// Build the HTTP client used for archive downloads.
pub fn build_http_client(config: &CatalogConfig) -> Result<Client, QuarryError> {
    Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| QuarryError::transport("could not build HTTP client", e))
}

/// Resolve `location` to a local archive, downloading it if needed.
pub async fn resolve(location: &str, client: &Client) -> Result<ResolvedArchive, QuarryError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(QuarryError::Config(
            "plugins path not provided to read schemas from".to_string(),
        ));
    }

    if tokio::fs::metadata(location).await.is_ok() {
        debug!(path = location, "using local plugin archive");
        return Ok(ResolvedArchive::Local(PathBuf::from(location)));
    }

    let file = tempfile::Builder::new()
        .prefix("plugins")
        .suffix(".zip")
        .tempfile()?;
    download(location, &file, client).await?;
    info!(url = location, path = %file.path().display(), "downloaded remote plugin archive");
    Ok(ResolvedArchive::Downloaded(file))
}

/// Stream the body at `url` into `target`.
async fn download(url: &str, target: &NamedTempFile, client: &Client) -> Result<(), QuarryError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| QuarryError::transport(format!("could not get zip from {url}"), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(QuarryError::Transport {
            message: format!("could not get zip from {url}: HTTP {status}"),
            source: None,
        });
    }

    let mut output = tokio::fs::File::from_std(target.reopen()?);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            QuarryError::transport(format!("could not read response body from {url}"), e)
        })?;
        output.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    output.flush().await?;

    debug!(url, bytes = written, "archive download complete");
    Ok(())
}

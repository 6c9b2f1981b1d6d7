// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest extraction from a plugin archive.
//!
//! Entries are visited in archive order. Only paths shaped like
//! `<any depth>/plugins/<dir>/<file>.yaml` are read; a sibling `logo.svg`
//! is attached when present.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use glob::{MatchOptions, Pattern};
use quarry_core::QuarryError;
use tracing::warn;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive paths that hold plugin manifests.
pub const MANIFEST_PATTERN: &str = "**/plugins/*/*.yaml";

/// File name of the optional logo next to a manifest.
pub const LOGO_FILE: &str = "logo.svg";

/// Most bytes reserved up front from an entry's declared size.
const MAX_PREALLOC: u64 = 64 * 1024;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A manifest read from the archive, with its optional logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedManifest {
    pub entry_name: String,
    pub manifest: Vec<u8>,
    pub logo: Option<Vec<u8>>,
}

/// Open a zip archive from a local path.
pub fn open_archive(path: &Path) -> Result<ZipArchive<File>, QuarryError> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|e| QuarryError::Archive {
        message: format!("could not open zip for reading: {}", path.display()),
        source: Some(Box::new(e)),
    })
}

/// Lazy, single-pass iterator over the manifests in an archive.
///
/// Entries that cannot be opened or read are logged and skipped.
pub struct ManifestEntries<'a, R: Read + Seek> {
    archive: &'a mut ZipArchive<R>,
    pattern: Pattern,
    next_index: usize,
}

impl<'a, R: Read + Seek> ManifestEntries<'a, R> {
    /// Iterate manifests matching [`MANIFEST_PATTERN`].
    pub fn new(archive: &'a mut ZipArchive<R>) -> Result<Self, QuarryError> {
        Self::with_pattern(archive, MANIFEST_PATTERN)
    }

    /// Iterate entries matching a custom glob pattern.
    ///
    /// A malformed pattern is a [`QuarryError::Pattern`].
    pub fn with_pattern(archive: &'a mut ZipArchive<R>, pattern: &str) -> Result<Self, QuarryError> {
        let compiled = Pattern::new(pattern).map_err(|e| QuarryError::Pattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
        Ok(Self {
            archive,
            pattern: compiled,
            next_index: 0,
        })
    }

    /// Name of entry `index` if it is a file matching the pattern.
    fn matching_name(&mut self, index: usize) -> Option<String> {
        let entry = match self.archive.by_index_raw(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(index, error = %e, "could not read archive entry header");
                return None;
            }
        };
        if entry.is_dir() || !self.pattern.matches_with(entry.name(), MATCH_OPTIONS) {
            return None;
        }
        Some(entry.name().to_string())
    }

    fn read_manifest(&mut self, index: usize, name: &str) -> Option<Vec<u8>> {
        let mut entry = match self.archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(name, error = %e, "could not open file");
                return None;
            }
        };
        // The declared size comes from the archive and may be forged.
        let mut buf = Vec::with_capacity(entry.size().min(MAX_PREALLOC) as usize);
        if let Err(e) = entry.read_to_end(&mut buf) {
            warn!(name, error = %e, "could not read file contents");
            return None;
        }
        Some(buf)
    }

    fn read_logo(&mut self, manifest_name: &str) -> Option<Vec<u8>> {
        let dir = manifest_name.rsplit_once('/').map_or("", |(dir, _)| dir);
        let logo_name = format!("{dir}/{LOGO_FILE}");
        let mut logo = match self.archive.by_name(&logo_name) {
            Ok(logo) => logo,
            Err(ZipError::FileNotFound) => return None,
            Err(e) => {
                warn!(name = manifest_name, error = %e, "could not open logo file");
                return None;
            }
        };
        let mut buf = Vec::new();
        match logo.read_to_end(&mut buf) {
            Ok(_) => Some(buf),
            Err(e) => {
                warn!(name = manifest_name, error = %e, "could not copy logo file");
                None
            }
        }
    }
}

impl<R: Read + Seek> Iterator for ManifestEntries<'_, R> {
    type Item = ExtractedManifest;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;

            let Some(name) = self.matching_name(index) else {
                continue;
            };
            let Some(manifest) = self.read_manifest(index, &name) else {
                continue;
            };
            let logo = self.read_logo(&name);
            return Some(ExtractedManifest {
                entry_name: name,
                manifest,
                logo,
            });
        }
        None
    }
}

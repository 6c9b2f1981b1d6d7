// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin archive fixtures.
//!
//! Builders panic on I/O failure; they only run inside tests.

use std::io::{Cursor, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

enum Entry {
    File(String, Vec<u8>),
    Dir(String),
}

/// Builds a zip archive entry by entry, preserving insertion order.
#[derive(Default)]
pub struct ArchiveBuilder {
    entries: Vec<Entry>,
    stored: bool,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store entries uncompressed so their bytes appear verbatim in the output.
    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    /// Add a file entry.
    pub fn file(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries
            .push(Entry::File(name.to_string(), contents.as_ref().to_vec()));
        self
    }

    /// Add a directory entry.
    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(Entry::Dir(name.to_string()));
        self
    }

    /// Add `<root>/plugins/<dir>/plugin.yaml` with the given manifest text.
    pub fn manifest(self, root: &str, dir: &str, yaml: &str) -> Self {
        let name = if root.is_empty() {
            format!("plugins/{dir}/plugin.yaml")
        } else {
            format!("{root}/plugins/{dir}/plugin.yaml")
        };
        self.file(&name, yaml)
    }

    /// Serialize the archive to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut options = FileOptions::default();
        if self.stored {
            options = options.compression_method(CompressionMethod::Stored);
        }
        for entry in &self.entries {
            match entry {
                Entry::File(name, contents) => {
                    writer
                        .start_file(name.as_str(), options)
                        .expect("start zip entry");
                    writer.write_all(contents).expect("write zip entry");
                }
                Entry::Dir(name) => {
                    writer
                        .add_directory(name.as_str(), options)
                        .expect("add zip directory");
                }
            }
        }
        writer.finish().expect("finish zip").into_inner()
    }

    /// Open the archive in memory.
    pub fn into_archive(self) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::new(Cursor::new(self.to_bytes())).expect("reopen fixture zip")
    }

    /// Write the archive to `path`.
    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).expect("write fixture zip");
    }

    /// Write the archive to a temporary `.zip` file.
    pub fn into_temp_file(self) -> NamedTempFile {
        let file = tempfile::Builder::new()
            .prefix("plugins")
            .suffix(".zip")
            .tempfile()
            .expect("create fixture file");
        self.write_to(file.path());
        file
    }
}

/// Flip the low bit of every byte in the first occurrence of `needle`.
///
/// Applied to [`ArchiveBuilder::stored`] output this breaks the checksum of
/// the entry holding `needle`, so reading it fails.
pub fn corrupt_bytes(archive: &mut [u8], needle: &[u8]) {
    let start = archive
        .windows(needle.len())
        .position(|window| window == needle)
        .expect("needle present in archive");
    for byte in &mut archive[start..start + needle.len()] {
        *byte ^= 0x01;
    }
}

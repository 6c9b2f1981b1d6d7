// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Quarry plugin catalog.

use thiserror::Error;

/// The primary error type used across the catalog store, the populate pass,
/// and the lookup path.
#[derive(Debug, Error)]
pub enum QuarryError {
    /// Missing or invalid configuration (e.g. no archive location).
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetching a remote archive failed (request error, non-2xx status, body error).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local filesystem errors (temp file creation, archive open, writes).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be opened or is not a valid zip.
    #[error("archive error: {message}")]
    Archive {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The manifest match pattern itself is malformed.
    #[error("invalid match pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    /// A manifest could not be parsed or does not have the expected structure.
    #[error("schema error: {0}")]
    Schema(String),

    /// Storage backend errors (connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No catalog entry exists for the given identifier.
    #[error("plugin not found: {uid}")]
    NotFound { uid: String },

    /// A catalog entry with this identifier already exists.
    #[error("plugin already exists: {uid}")]
    AlreadyExists { uid: String },

    /// The lookup query combination is not supported.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// The store could not resolve a lookup.
    #[error("could not lookup plugin {name}: {source}")]
    Lookup {
        name: String,
        source: Box<QuarryError>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QuarryError {
    /// Builds a transport error from any underlying error.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        QuarryError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error (or the error it wraps) is a missing-entry error.
    pub fn is_not_found(&self) -> bool {
        match self {
            QuarryError::NotFound { .. } => true,
            QuarryError::Lookup { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

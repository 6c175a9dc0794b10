//! Domain error types
//!
//! [`DomainError`] covers validation failures of domain values.
//! [`StorageError`] is the typed result of a remote file operation: every
//! failure an operation can hit is converted into one of its variants at the
//! use case boundary, so nothing below the CLI has to unwind.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),
}

/// Errors returned by the remote file operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// A listing returned zero non-trashed files
    #[error("No files found.")]
    NoFilesFound,

    /// A name lookup returned zero matches
    #[error("No files found named '{name}'")]
    NotFound {
        /// The name that was looked up
        name: String,
    },

    /// A name lookup returned several matches while uniqueness is required
    #[error("{count} files share the name '{name}'; refusing to pick one")]
    AmbiguousName {
        /// The name that was looked up
        name: String,
        /// Number of matches returned by the service (capped by the page size)
        count: usize,
    },

    /// The destination extension has no export format
    #[error("Cannot export to '.{extension}': no MIME type is mapped to this extension")]
    UnsupportedExport {
        /// Extension of the destination file name
        extension: String,
    },

    /// Reading or writing a local file failed
    #[error("Local file error on {}: {source}", path.display())]
    LocalIo {
        /// The local path involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Communicating with the remote service failed
    #[error("An error occurred: {0}")]
    Transport(String),
}

impl StorageError {
    /// Builds a [`StorageError::Transport`] from an adapter error, keeping the
    /// full context chain in the message.
    pub fn transport(err: &anyhow::Error) -> Self {
        Self::Transport(format!("{err:#}"))
    }

    /// Returns true for the "nothing matched" outcomes
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoFilesFound | Self::NotFound { .. })
    }
}

//! Remote storage port (driven/secondary port)
//!
//! The minimum contract the file operations need from the remote service.
//! The primary implementation targets Google Drive v3.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific;
//!   the use case layer classifies them into [`StorageError`](crate::domain::StorageError).
//! - Content is pushed chunk by chunk into a [`ContentSink`] so that the caller
//!   controls where bytes land and can report progress as they arrive.

use std::path::Path;

use crate::domain::{RemoteFile, RemoteId};

/// A listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    /// Exact display name to match, or `None` for any name
    pub name: Option<String>,
    /// Skip objects that are in the trash
    pub exclude_trashed: bool,
    /// Maximum number of results
    pub page_size: u32,
}

impl FileQuery {
    /// Lists any non-trashed file
    pub fn all(page_size: u32) -> Self {
        Self {
            name: None,
            exclude_trashed: true,
            page_size,
        }
    }

    /// Lists non-trashed files whose name is exactly `name`
    pub fn by_name(name: impl Into<String>, page_size: u32) -> Self {
        Self {
            name: Some(name.into()),
            exclude_trashed: true,
            page_size,
        }
    }
}

/// Metadata for an object about to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    /// Display name of the new object
    pub name: String,
    /// Declared content type; `None` lets the service infer it
    pub mime_type: Option<String>,
}

/// How content should be retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFormat {
    /// Stored bytes, unconverted
    Raw,
    /// Server-side conversion of a native document to `mime_type`
    Export {
        /// Target format
        mime_type: String,
    },
}

/// Receives downloaded content as it streams in
pub trait ContentSink: Send {
    /// Called once per received chunk
    ///
    /// # Arguments
    /// * `chunk` - The bytes of this chunk
    /// * `total_len` - Full content length if the service announced it
    fn write_chunk(&mut self, chunk: &[u8], total_len: Option<u64>) -> std::io::Result<()>;
}

/// Port trait for remote file store operations
///
/// All methods assume a valid credential was obtained beforehand.
/// Implementations must not retry: a failed call is reported as-is.
#[async_trait::async_trait]
pub trait IRemoteStorage: Send + Sync {
    /// Lists files matching the query, in service order
    async fn list_files(&self, query: &FileQuery) -> anyhow::Result<Vec<RemoteFile>>;

    /// Creates a new object with content streamed from `source`
    ///
    /// Never replaces an existing object, even one with the same name.
    async fn create_file(&self, file: &NewFile, source: &Path) -> anyhow::Result<RemoteFile>;

    /// Streams an object's content into `sink`
    ///
    /// # Returns
    /// The number of bytes delivered to the sink
    async fn fetch_content(
        &self,
        id: &RemoteId,
        format: &ContentFormat,
        sink: &mut dyn ContentSink,
    ) -> anyhow::Result<u64>;

    /// Permanently deletes an object by ID
    async fn delete_file(&self, id: &RemoteId) -> anyhow::Result<()>;
}

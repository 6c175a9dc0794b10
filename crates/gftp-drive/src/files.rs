//! File operations against the Drive v3 `files` collection
//!
//! - [`list_files`] - `GET /files` with a query built from [`FileQuery`]
//! - [`fetch_content`] - `GET /files/{id}?alt=media` or `GET /files/{id}/export`
//! - [`delete_file`] - `DELETE /files/{id}`
//!
//! ## Drive API References
//!
//! - [files.list](https://developers.google.com/drive/api/reference/rest/v3/files/list)
//! - [Search query terms](https://developers.google.com/drive/api/guides/ref-search-terms)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use gftp_core::domain::{RemoteFile, RemoteId};
use gftp_core::ports::{ContentFormat, ContentSink, FileQuery};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::client::DriveClient;
use crate::{check_response, DriveError};

/// Partial response selector for single file resources
pub(crate) const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime,size";

/// Partial response selector for listings
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,modifiedTime,size)";

// ============================================================================
// Drive API response types
// ============================================================================

/// A `files` resource, restricted to [`FILE_FIELDS`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveFile {
    id: String,
    name: String,
    mime_type: Option<String>,
    modified_time: Option<DateTime<Utc>>,
    /// int64 encoded as a JSON string
    size: Option<String>,
}

/// Response of `files.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    #[allow(dead_code)]
    next_page_token: Option<String>,
}

impl DriveFile {
    /// Converts into the port-level [`RemoteFile`]
    pub(crate) fn into_remote_file(self) -> Result<RemoteFile, DriveError> {
        let id = RemoteId::new(self.id)
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))?;
        let size = match self.size {
            Some(s) => Some(
                s.parse::<u64>()
                    .map_err(|_| DriveError::InvalidResponse(format!("invalid size '{s}'")))?,
            ),
            None => None,
        };

        Ok(RemoteFile {
            id,
            name: self.name,
            mime_type: self
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            modified_time: self.modified_time,
            size,
        })
    }
}

// ============================================================================
// Query construction
// ============================================================================

/// Escapes a string literal for the Drive query language
///
/// Backslashes and single quotes are backslash-escaped.
pub fn escape_query_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the `q` parameter for a listing, or `None` when nothing is filtered
pub fn build_query(query: &FileQuery) -> Option<String> {
    let mut terms = Vec::new();
    if let Some(name) = &query.name {
        terms.push(format!("name = '{}'", escape_query_value(name)));
    }
    if query.exclude_trashed {
        terms.push("trashed = false".to_string());
    }

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" and "))
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Lists files matching `query`, in service order
///
/// Only the first page is requested; `page_size` bounds the result.
pub async fn list_files(client: &DriveClient, query: &FileQuery) -> Result<Vec<RemoteFile>> {
    let page_size = query.page_size.to_string();
    let mut params = vec![("pageSize", page_size.as_str()), ("fields", LIST_FIELDS)];
    let q = build_query(query);
    if let Some(q) = &q {
        params.push(("q", q.as_str()));
    }

    debug!(q = q.as_deref().unwrap_or(""), page_size = query.page_size, "Listing files");

    let response = client
        .request(Method::GET, "/files")
        .query(&params)
        .send()
        .await
        .context("Failed to send list request")?;

    let list: FileList = check_response(response)
        .await
        .context("List request returned error status")?
        .json()
        .await
        .context("Failed to parse file list response")?;

    let files = list
        .files
        .into_iter()
        .map(DriveFile::into_remote_file)
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid file in list response")?;

    debug!(count = files.len(), "Listed files");
    Ok(files)
}

/// Streams a file's content into `sink`
///
/// [`ContentFormat::Raw`] fetches the stored bytes with `alt=media`;
/// [`ContentFormat::Export`] asks the service to convert a native document.
///
/// # Returns
/// The number of bytes delivered to the sink
pub async fn fetch_content(
    client: &DriveClient,
    id: &RemoteId,
    format: &ContentFormat,
    sink: &mut dyn ContentSink,
) -> Result<u64> {
    let request = match format {
        ContentFormat::Raw => client
            .request(Method::GET, &format!("/files/{}", id.as_str()))
            .query(&[("alt", "media")]),
        ContentFormat::Export { mime_type } => client
            .request(Method::GET, &format!("/files/{}/export", id.as_str()))
            .query(&[("mimeType", mime_type.as_str())]),
    };

    debug!(id = %id, ?format, "Fetching content");

    let response = request
        .send()
        .await
        .context("Failed to send download request")?;
    let response = check_response(response)
        .await
        .context("Download request returned error status")?;

    let total = response.content_length();
    let mut stream = response.bytes_stream();
    let mut received: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Failed to read download stream")?;
        sink.write_chunk(&chunk, total)
            .context("Failed to store downloaded content")?;
        received += chunk.len() as u64;
    }

    if let Some(expected) = total {
        if received != expected {
            return Err(DriveError::InvalidResponse(format!(
                "download ended after {received} of {expected} bytes"
            ))
            .into());
        }
    }

    debug!(id = %id, bytes = received, "Content fetched");
    Ok(received)
}

/// Permanently deletes a file, bypassing the trash
pub async fn delete_file(client: &DriveClient, id: &RemoteId) -> Result<()> {
    debug!(id = %id, "Deleting file");

    let response = client
        .request(Method::DELETE, &format!("/files/{}", id.as_str()))
        .send()
        .await
        .context("Failed to send delete request")?;
    check_response(response)
        .await
        .context("Delete request returned error status")?;

    Ok(())
}

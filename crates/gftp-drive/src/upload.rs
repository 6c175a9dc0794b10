//! Upload operations for the Drive v3 API
//!
//! Every upload uses a resumable session:
//! - [`create_upload_session`] - `POST /files?uploadType=resumable` with the
//!   file metadata; the session URI comes back in the `Location` header
//! - [`upload_content`] - `PUT <session URI>` with the file body streamed
//!   from disk
//! - [`upload_file`] - Both steps for one local file
//!
//! Uploads always create a new file. Drive allows several files with the
//! same name, so nothing existing is replaced.
//!
//! ## Drive API References
//!
//! - [Resumable upload](https://developers.google.com/drive/api/guides/manage-uploads#resumable)

use std::path::Path;

use anyhow::{Context, Result};
use gftp_core::domain::RemoteFile;
use gftp_core::ports::NewFile;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Method};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::client::DriveClient;
use crate::files::{DriveFile, FILE_FIELDS};
use crate::{check_response, DriveError};

/// Metadata body of the session request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
}

/// Creates a resumable upload session
///
/// # Arguments
/// * `client` - The authenticated DriveClient
/// * `file` - Name and optional MIME type of the new file
/// * `size` - Content length that will be sent
///
/// # Returns
/// The session URI to send the content to
pub async fn create_upload_session(
    client: &DriveClient,
    file: &NewFile,
    size: u64,
) -> Result<String> {
    debug!(name = %file.name, size, "Creating upload session");

    let metadata = FileMetadata {
        name: &file.name,
        mime_type: file.mime_type.as_deref(),
    };

    let mut request = client
        .upload_request(Method::POST, "/files")
        .query(&[("uploadType", "resumable"), ("fields", FILE_FIELDS)])
        .header("X-Upload-Content-Length", size.to_string())
        .json(&metadata);
    if let Some(mime) = &file.mime_type {
        request = request.header("X-Upload-Content-Type", mime.as_str());
    }

    let response = request
        .send()
        .await
        .context("Failed to create upload session")?;
    let response = check_response(response)
        .await
        .context("Create upload session returned error status")?;

    let session_uri = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            DriveError::InvalidResponse("upload session response has no Location header".into())
        })?;

    debug!(session = %session_uri, "Upload session created");
    Ok(session_uri)
}

/// Sends the whole content of `source` to an upload session
///
/// The body is streamed from disk, so memory use does not grow with the
/// file size.
pub async fn upload_content(
    client: &DriveClient,
    session_uri: &str,
    source: &Path,
    size: u64,
    mime_type: Option<&str>,
) -> Result<RemoteFile> {
    let file = tokio::fs::File::open(source)
        .await
        .with_context(|| format!("Failed to open {}", source.display()))?;
    let body = Body::wrap_stream(ReaderStream::new(file));

    let mut request = client
        .request_url(Method::PUT, session_uri)
        .header(CONTENT_LENGTH, size);
    // Without a known type Drive infers one from the content
    if let Some(mime_type) = mime_type {
        request = request.header(CONTENT_TYPE, mime_type);
    }

    let response = request
        .body(body)
        .send()
        .await
        .context("Failed to send upload content")?;

    let created: DriveFile = check_response(response)
        .await
        .context("Upload returned error status")?
        .json()
        .await
        .context("Failed to parse upload response")?;

    Ok(created.into_remote_file()?)
}

/// Uploads a local file as a new Drive file
///
/// # Errors
/// Returns an error if the local file cannot be read, the session cannot be
/// created, or the content upload fails
pub async fn upload_file(client: &DriveClient, file: &NewFile, source: &Path) -> Result<RemoteFile> {
    let size = tokio::fs::metadata(source)
        .await
        .with_context(|| format!("Failed to stat {}", source.display()))?
        .len();

    info!(name = %file.name, size, "Starting resumable upload");

    let session_uri = create_upload_session(client, file, size).await?;
    let created = upload_content(client, &session_uri, source, size, file.mime_type.as_deref())
        .await
        .with_context(|| format!("Failed to upload {}", file.name))?;

    info!(id = %created.id, name = %created.name, "Upload completed");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serialization() {
        let with_type = FileMetadata {
            name: "notes.txt",
            mime_type: Some("text/plain"),
        };
        assert_eq!(
            serde_json::to_value(&with_type).unwrap(),
            serde_json::json!({"name": "notes.txt", "mimeType": "text/plain"})
        );

        let without_type = FileMetadata {
            name: "tool.bin",
            mime_type: None,
        };
        assert_eq!(
            serde_json::to_value(&without_type).unwrap(),
            serde_json::json!({"name": "tool.bin"})
        );
    }
}

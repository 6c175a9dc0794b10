//! Shared test helpers for Drive API integration tests
//!
//! Provides wiremock-based mock server setup for the Drive v3 endpoints.
//! Each helper mounts the necessary mock endpoints; [`setup_drive_mock`]
//! returns a DriveClient pointing at the mock server.

use std::sync::Arc;

use gftp_core::ports::ContentSink;
use gftp_core::usecases::{RemoteFileOperations, StorageSettings};
use gftp_drive::{client::DriveClient, storage::DriveStorage};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a (MockServer, DriveClient) tuple.
///
/// The API lives under `/drive/v3` and uploads under `/upload/drive/v3`,
/// mirroring the public layout.
pub async fn setup_drive_mock() -> (MockServer, DriveClient) {
    let server = MockServer::start().await;
    let client = DriveClient::with_base_urls(
        ACCESS_TOKEN,
        format!("{}/drive/v3", server.uri()),
        format!("{}/upload/drive/v3", server.uri()),
    )
    .expect("build client");
    (server, client)
}

/// Wraps a client into the file operations use case with default settings
pub fn operations(client: DriveClient) -> RemoteFileOperations {
    RemoteFileOperations::new(
        Arc::new(DriveStorage::new(client)),
        StorageSettings::default(),
    )
}

/// A `files` resource as Drive returns it
pub fn file_json(id: &str, name: &str, mime_type: &str, size: Option<u64>) -> Value {
    let mut file = json!({
        "id": id,
        "name": name,
        "mimeType": mime_type,
        "modifiedTime": "2024-05-01T08:30:00.000Z",
    });
    if let Some(size) = size {
        file["size"] = json!(size.to_string());
    }
    file
}

/// Mounts `GET /files` answering the given `q` with `files`
pub async fn mount_list(server: &MockServer, q: &str, files: Value) {
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", q))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": files })))
        .mount(server)
        .await;
}

/// Mounts the name lookup for `name` returning `files`
pub async fn mount_lookup(server: &MockServer, name: &str, files: Value) {
    mount_list(server, &format!("name = '{name}' and trashed = false"), files).await;
}

/// Mounts `GET /files/{id}?alt=media` returning `content`
pub async fn mount_media(server: &MockServer, id: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{id}")))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Collects fetched content in memory
#[derive(Default)]
pub struct VecSink {
    pub data: Vec<u8>,
    pub totals: Vec<Option<u64>>,
}

impl ContentSink for VecSink {
    fn write_chunk(&mut self, chunk: &[u8], total_len: Option<u64>) -> std::io::Result<()> {
        self.data.extend_from_slice(chunk);
        self.totals.push(total_len);
        Ok(())
    }
}

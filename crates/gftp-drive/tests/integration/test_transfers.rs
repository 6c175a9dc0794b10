//! Integration tests for uploads and downloads
//!
//! Verifies the resumable upload handshake and raw/export downloads against
//! a wiremock-based Drive API mock server.

use gftp_core::domain::{RemoteId, StorageError};
use gftp_core::ports::{ContentFormat, NewFile};
use gftp_drive::{files, upload};
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

/// Mounts both legs of a resumable upload for `name` with `content`
async fn mount_resumable_upload(
    server: &MockServer,
    name: &str,
    mime_type: &str,
    content: &str,
    created_id: &str,
) {
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "resumable"))
        .and(header("X-Upload-Content-Type", mime_type))
        .and(header("X-Upload-Content-Length", content.len().to_string().as_str()))
        .and(body_json(json!({"name": name, "mimeType": mime_type})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Location", format!("{}/upload/session/s-1", server.uri()).as_str()),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/session/s-1"))
        .and(header("Content-Type", mime_type))
        .and(body_string(content))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            created_id,
            name,
            mime_type,
            Some(content.len() as u64),
        )))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Upload tests
// ============================================================================

#[tokio::test]
async fn test_upload_uses_resumable_session() {
    let (server, client) = common::setup_drive_mock().await;
    mount_resumable_upload(&server, "notes.txt", "text/plain", "remember the milk", "up-1").await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("notes.txt");
    std::fs::write(&local, "remember the milk").unwrap();

    let ops = common::operations(client);
    let created = ops.upload(&local).await.expect("Upload failed");

    assert_eq!(created.id.as_str(), "up-1");
    assert_eq!(created.name, "notes.txt");
    assert_eq!(created.mime_type, "text/plain");
    assert_eq!(created.size, Some(17));
}

#[tokio::test]
async fn test_upload_without_known_type_omits_mime() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(body_json(json!({"name": "tool.bin"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Location", format!("{}/upload/session/s-2", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/session/s-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_json(
            "bin-1",
            "tool.bin",
            "application/octet-stream",
            Some(2),
        )))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("tool.bin");
    std::fs::write(&local, [0u8, 1u8]).unwrap();

    let file = NewFile {
        name: "tool.bin".to_string(),
        mime_type: None,
    };
    let created = upload::upload_file(&client, &file, &local)
        .await
        .expect("Upload failed");
    assert_eq!(created.id.as_str(), "bin-1");

    let requests = server.received_requests().await.expect("recording enabled");
    let session = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("session request");
    assert!(!session.headers.contains_key("x-upload-content-type"));
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("content request");
    assert!(!put.headers.contains_key("content-type"));
    assert_eq!(put.headers["content-length"], "2");
    assert_eq!(put.body, vec![0u8, 1u8]);
}

#[tokio::test]
async fn test_upload_session_without_location_fails() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let file = NewFile {
        name: "a.txt".to_string(),
        mime_type: Some("text/plain".to_string()),
    };
    let err = upload::create_upload_session(&client, &file, 1)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Location"));
}

// ============================================================================
// Download tests
// ============================================================================

#[tokio::test]
async fn test_fetch_raw_content_reports_length() {
    let (server, client) = common::setup_drive_mock().await;
    let content: Vec<u8> = (0..65_536u32).map(|i| (i % 251) as u8).collect();
    common::mount_media(&server, "raw-1", &content).await;

    let mut sink = common::VecSink::default();
    let id = RemoteId::new("raw-1".to_string()).unwrap();
    let received = files::fetch_content(&client, &id, &ContentFormat::Raw, &mut sink)
        .await
        .expect("Fetch failed");

    assert_eq!(received, 65_536);
    assert_eq!(sink.data, content);
    assert!(sink.totals.iter().all(|t| *t == Some(65_536)));
}

#[tokio::test]
async fn test_download_round_trip_with_progress() {
    let (server, client) = common::setup_drive_mock().await;
    let content = b"Hello, Drive! This is test content.";
    common::mount_lookup(
        &server,
        "hello.txt",
        json!([common::file_json("dl-1", "hello.txt", "text/plain", Some(content.len() as u64))]),
    )
    .await;
    common::mount_media(&server, "dl-1", content).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("hello.txt");
    let mut seen: Vec<u8> = Vec::new();

    let ops = common::operations(client);
    let report = ops
        .download("hello.txt", &dest, &mut |p: u8| seen.push(p))
        .await
        .expect("Download failed");

    assert_eq!(std::fs::read(&dest).unwrap(), content);
    assert_eq!(report.bytes_written, content.len() as u64);
    assert_eq!(report.exported_as, None);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn test_download_native_document_exports() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(
        &server,
        "Quarterly Plan",
        json!([common::file_json(
            "doc-1",
            "Quarterly Plan",
            "application/vnd.google-apps.document",
            None
        )]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/doc-1/export"))
        .and(query_param("mimeType", "application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 fake".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("plan.pdf");

    let ops = common::operations(client);
    let report = ops
        .download("Quarterly Plan", &dest, &mut |_: u8| {})
        .await
        .expect("Export failed");

    assert_eq!(report.exported_as.as_deref(), Some("application/pdf"));
    assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.7 fake");
}

#[tokio::test]
async fn test_download_missing_name_creates_nothing() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(&server, "absent.txt", json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("absent.txt");

    let ops = common::operations(client);
    let err = ops
        .download("absent.txt", &dest, &mut |_: u8| {})
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_download_http_error_leaves_no_file() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(
        &server,
        "gone.txt",
        json!([common::file_json("gone-1", "gone.txt", "text/plain", Some(4))]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files/gone-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "File not found: gone-1."}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("gone.txt");

    let ops = common::operations(client);
    let err = ops
        .download("gone.txt", &dest, &mut |_: u8| {})
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Transport(ref d) if d.contains("File not found")));
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

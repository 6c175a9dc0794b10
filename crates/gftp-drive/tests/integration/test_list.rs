//! Integration tests for listing and name lookup

use gftp_core::domain::StorageError;
use gftp_core::ports::FileQuery;
use gftp_drive::files;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_list_sends_query_and_parses_files() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(query_param("q", "trashed = false"))
        .and(query_param("pageSize", "10"))
        .and(query_param(
            "fields",
            "nextPageToken,files(id,name,mimeType,modifiedTime,size)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                common::file_json("id-1", "notes.txt", "text/plain", Some(12)),
                common::file_json("id-2", "Plan", "application/vnd.google-apps.document", None),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = files::list_files(&client, &FileQuery::all(10))
        .await
        .expect("List failed");

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].name, "notes.txt");
    assert_eq!(files[0].size, Some(12));
    assert!(files[1].is_native_document());
    assert_eq!(
        files[0].to_string(),
        "notes.txt (text/plain, 2024-05-01T08:30:00.000Z)"
    );
}

#[tokio::test]
async fn test_name_lookup_escapes_quotes() {
    let (server, client) = common::setup_drive_mock().await;

    common::mount_list(
        &server,
        "name = 'Bob\\'s notes.txt' and trashed = false",
        json!([common::file_json("id-9", "Bob's notes.txt", "text/plain", Some(3))]),
    )
    .await;

    let files = files::list_files(&client, &FileQuery::by_name("Bob's notes.txt", 10))
        .await
        .expect("List failed");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id.as_str(), "id-9");
}

#[tokio::test]
async fn test_ls_limit_is_passed_as_page_size() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageSize", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [common::file_json("id-1", "a.txt", "text/plain", Some(1))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = common::operations(client);
    let files = ops.list_files(Some(3)).await.expect("List failed");
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_empty_listing_is_no_files_found() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_list(&server, "trashed = false", json!([])).await;

    let ops = common::operations(client);
    let err = ops.list_files(None).await.unwrap_err();
    assert!(matches!(err, StorageError::NoFilesFound));
    assert_eq!(err.to_string(), "No files found.");
}

#[tokio::test]
async fn test_server_error_becomes_transport_error() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Backend Error"}
        })))
        .mount(&server)
        .await;

    let ops = common::operations(client);
    let err = ops.list_files(None).await.unwrap_err();
    match err {
        StorageError::Transport(detail) => {
            assert!(detail.contains("Server error: Backend Error"), "{detail}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_reported() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;

    let err = files::list_files(&client, &FileQuery::all(10))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Unauthorized: Invalid Credentials"));
}

#[tokio::test]
async fn test_find_by_name_returns_first_match() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(
        &server,
        "dup.txt",
        json!([
            common::file_json("first", "dup.txt", "text/plain", Some(1)),
            common::file_json("second", "dup.txt", "text/plain", Some(2)),
        ]),
    )
    .await;

    let ops = common::operations(client);
    let found = ops.find_by_name("dup.txt").await.unwrap().unwrap();
    assert_eq!(found.id.as_str(), "first");
}

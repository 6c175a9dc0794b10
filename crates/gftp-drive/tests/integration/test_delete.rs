//! Integration tests for deletion

use gftp_core::domain::StorageError;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_remove_deletes_by_id() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(
        &server,
        "notes.txt",
        json!([common::file_json("note-1", "notes.txt", "text/plain", Some(5))]),
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/note-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ops = common::operations(client);
    let removed = ops.remove("notes.txt").await.expect("Remove failed");
    assert_eq!(removed.id.as_str(), "note-1");
}

#[tokio::test]
async fn test_remove_missing_name_sends_no_delete() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(&server, "ghost.txt", json!([])).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let ops = common::operations(client);
    let err = ops.remove("ghost.txt").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { ref name } if name == "ghost.txt"));
}

#[tokio::test]
async fn test_remove_forbidden() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_lookup(
        &server,
        "shared.pdf",
        json!([common::file_json("sh-1", "shared.pdf", "application/pdf", Some(9))]),
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/drive/v3/files/sh-1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "The user does not have sufficient permissions for this file."}
        })))
        .mount(&server)
        .await;

    let ops = common::operations(client);
    let err = ops.remove("shared.pdf").await.unwrap_err();
    assert!(matches!(err, StorageError::Transport(ref d) if d.contains("Forbidden")));
}

//! Integration tests for credential renewal against a mock token endpoint

use std::path::Path;

use chrono::{Duration, Utc};
use gftp_core::config::AuthConfig;
use gftp_core::ports::{Credential, ICredentialProvider};
use gftp_drive::auth::{AuthError, TokenFileStorage};
use gftp_drive::DriveCredentialProvider;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_client_secret(dir: &Path, token_uri: &str) -> std::path::PathBuf {
    let path = dir.join("creds.json");
    let body = json!({
        "installed": {
            "client_id": "test-client.apps.googleusercontent.com",
            "client_secret": "test-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": token_uri,
        }
    });
    std::fs::write(&path, body.to_string()).unwrap();
    path
}

fn auth_config(dir: &Path, client_secret_file: std::path::PathBuf) -> AuthConfig {
    AuthConfig {
        client_secret_file,
        token_file: dir.join("token.json"),
        scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
        callback_port: 0,
    }
}

#[tokio::test]
async fn test_valid_cached_credential_is_used_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let config = auth_config(dir.path(), dir.path().join("creds.json"));

    let cached = Credential {
        access_token: "ya29.cached".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expires_at: Utc::now() + Duration::hours(1),
    };
    TokenFileStorage::new(&config.token_file).store(&cached).unwrap();

    let provider = DriveCredentialProvider::new(&config);
    let credential = provider.valid_credential().await.expect("credential");
    assert_eq!(credential, cached);
}

#[tokio::test]
async fn test_expired_credential_is_refreshed_and_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.renewed",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "https://www.googleapis.com/auth/drive"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let secret = write_client_secret(dir.path(), &format!("{}/token", server.uri()));
    let config = auth_config(dir.path(), secret);

    let storage = TokenFileStorage::new(&config.token_file);
    storage
        .store(&Credential {
            access_token: "ya29.stale".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            // Inside the renewal window, not yet expired
            expires_at: Utc::now() + Duration::seconds(30),
        })
        .unwrap();

    let provider = DriveCredentialProvider::new(&config);
    let credential = provider.valid_credential().await.expect("refresh");

    assert_eq!(credential.access_token, "ya29.renewed");
    assert_eq!(credential.refresh_token.as_deref(), Some("1//refresh"));
    assert!(!credential.is_expired());
    assert_eq!(storage.load().unwrap(), Some(credential));
}

#[tokio::test]
async fn test_missing_client_secret_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = auth_config(dir.path(), dir.path().join("missing-creds.json"));

    let provider = DriveCredentialProvider::new(&config);
    let err = provider.valid_credential().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AuthError>(),
        Some(AuthError::MissingClientSecret { .. })
    ));
    assert!(!config.token_file.exists());
}

#[tokio::test]
async fn test_logout_removes_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = auth_config(dir.path(), dir.path().join("creds.json"));
    let provider = DriveCredentialProvider::new(&config);

    assert!(!provider.logout().unwrap());

    provider
        .token_storage()
        .store(&Credential {
            access_token: "ya29.a".to_string(),
            refresh_token: None,
            expires_at: Utc::now(),
        })
        .unwrap();
    assert!(provider.cached().unwrap().is_some());
    assert!(provider.logout().unwrap());
    assert!(provider.cached().unwrap().is_none());
}

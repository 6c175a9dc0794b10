//! gftp Drive - Google Drive v3 adapter
//!
//! Provides async clients for:
//! - OAuth2 installed-app authorization (Authorization Code with PKCE)
//! - Listing, downloading, exporting and deleting files via the Drive v3 API
//! - Resumable uploads streamed from disk
//!
//! ## Modules
//!
//! - [`auth`] - Client secret parsing, token cache and the interactive flow
//! - [`client`] - Drive v3 HTTP client
//! - [`files`] - Listing, content download and deletion
//! - [`upload`] - Resumable upload sessions
//! - [`storage`] - [`IRemoteStorage`](gftp_core::ports::IRemoteStorage) implementation

pub mod auth;
pub mod client;
pub mod files;
pub mod storage;
pub mod upload;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub use auth::{AuthError, DriveCredentialProvider};
pub use client::DriveClient;
pub use storage::DriveStorage;

/// Errors that can occur when communicating with the Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions, or a quota was exceeded
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other unsuccessful status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        message: String,
    },
}

/// Error body returned by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

impl DriveError {
    /// Classifies an unsuccessful response by status code
    ///
    /// `body` is the raw response body; the `error.message` field is used
    /// when it parses, the canonical reason phrase otherwise.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            });

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            s if s.is_server_error() => Self::ServerError(message),
            s => Self::Status {
                status: s.as_u16(),
                message,
            },
        }
    }
}

/// Passes successful responses through and turns the rest into [`DriveError`]
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DriveError::from_status(status, &body))
}

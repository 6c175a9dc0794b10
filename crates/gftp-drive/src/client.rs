//! Google Drive v3 API client
//!
//! Provides a typed HTTP client for the Drive v3 REST and upload endpoints.
//! Handles authentication headers and endpoint construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gftp_core::ports::FileQuery;
//! use gftp_drive::client::DriveClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("ya29.access-token")?;
//! let files = gftp_drive::files::list_files(&client, &FileQuery::all(10)).await?;
//! for file in files {
//!     println!("{file}");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use gftp_core::config::{DEFAULT_API_BASE_URL, DEFAULT_UPLOAD_BASE_URL};
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

/// Connect timeout for every request; transfers themselves are not bounded
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for Drive v3 calls
///
/// Owns its `reqwest::Client`; connections are released when the
/// `DriveClient` is dropped.
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for metadata and content requests
    api_base_url: String,
    /// Base URL for upload requests
    upload_base_url: String,
    /// Current OAuth2 access token
    access_token: String,
}

impl DriveClient {
    /// Creates a client against the public Drive endpoints
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_urls(access_token, DEFAULT_API_BASE_URL, DEFAULT_UPLOAD_BASE_URL)
    }

    /// Creates a client with custom base URLs (configuration or tests)
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `api_base_url` - Base for `files` metadata and content calls
    /// * `upload_base_url` - Base for upload calls
    pub fn with_base_urls(
        access_token: impl Into<String>,
        api_base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let api_base_url = trim_base(api_base_url.into());
        let upload_base_url = trim_base(upload_base_url.into());
        debug!(api = %api_base_url, upload = %upload_base_url, "Created DriveClient");

        Ok(Self {
            client,
            api_base_url,
            upload_base_url,
            access_token: access_token.into(),
        })
    }

    /// Creates an authenticated request against the API base URL
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path relative to the base URL, e.g. `/files`
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Creates an authenticated request against the upload base URL
    pub fn upload_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.upload_base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Creates an authenticated request to an absolute URL, such as an
    /// upload session URI
    pub fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
    }
}

fn trim_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

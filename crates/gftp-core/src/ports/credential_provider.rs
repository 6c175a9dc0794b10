//! Credential provider port
//!
//! Supplies the bearer credential used by the remote storage adapter. The
//! provider owns the credential: it refreshes or re-authorizes as needed and
//! persists renewed credentials. The core only reads it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth bearer credential
///
/// Serialized as-is into the token cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for obtaining a new access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: Duration) -> bool {
        Utc::now() + duration >= self.expires_at
    }

    /// Returns true if the credential can be renewed without user interaction
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Port trait for obtaining a usable credential
#[async_trait::async_trait]
pub trait ICredentialProvider: Send + Sync {
    /// Returns a credential whose expiry has not passed
    ///
    /// Refreshes or re-runs interactive authorization as needed and persists
    /// any renewed credential before returning it.
    async fn valid_credential(&self) -> anyhow::Result<Credential>;
}

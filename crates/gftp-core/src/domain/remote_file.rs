//! Remote file metadata

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

/// MIME prefix of Google-native document types (Docs, Sheets, Slides, ...)
///
/// Objects of these types have no binary content of their own and can only
/// be downloaded through an export to a concrete format.
pub const NATIVE_DOCUMENT_PREFIX: &str = "application/vnd.google-apps.";

/// One object in the remote store
///
/// `id` is unique and stable for the object's lifetime. `name` is the
/// user-visible display name and is not unique: several objects may share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Service-assigned identifier
    pub id: RemoteId,
    /// Display name
    pub name: String,
    /// Content format, or a Google-native document type
    pub mime_type: String,
    /// Last modification time reported by the service
    pub modified_time: Option<DateTime<Utc>>,
    /// Size in bytes (absent for native documents)
    pub size: Option<u64>,
}

impl RemoteFile {
    /// Returns true if this object is a Google-native document that must be
    /// exported rather than fetched as raw bytes
    pub fn is_native_document(&self) -> bool {
        self.mime_type.starts_with(NATIVE_DOCUMENT_PREFIX)
    }
}

impl Display for RemoteFile {
    /// Renders the listing line: `name (mimeType, modifiedTime)`
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let modified = self
            .modified_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| "unknown".to_string());
        write!(f, "{} ({}, {})", self.name, self.mime_type, modified)
    }
}

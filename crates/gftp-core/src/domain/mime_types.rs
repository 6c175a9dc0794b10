//! Extension to MIME type table
//!
//! Used to classify uploads and to pick an export format for downloads of
//! Google-native documents. The key of a lookup is the substring after the
//! last `.` of a file name. A name without any `.` is used whole as the key,
//! which normally matches nothing. Unknown keys yield `None`, in which case
//! the caller lets the service infer the type.

use std::collections::HashMap;

/// Built-in mappings
///
/// `json` maps to the Apps Script export type rather than
/// `application/json`, so that `dcp <script> out.json` exports a script project.
const DEFAULT_MIME_TYPES: &[(&str, &str)] = &[
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("rtf", "application/rtf"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("zip", "application/zip"),
    ("epub", "application/epub+zip"),
    ("md", "text/markdown"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ods", "application/x-vnd.oasis.opendocument.spreadsheet"),
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("json", "application/vnd.google-apps.script+json"),
];

/// Static mapping from file extension to MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypeTable {
    entries: HashMap<String, String>,
}

impl MimeTypeTable {
    /// Creates a table with no mappings
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds or replaces entries, e.g. from the `mime_types` config section
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (ext, mime) in overrides {
            self.entries.insert(ext.into(), mime.into());
        }
        self
    }

    /// Returns the lookup key of a file name: the part after the last `.`
    pub fn extension_key(name: &str) -> &str {
        name.rsplit('.').next().unwrap_or(name)
    }

    /// Looks up the MIME type for a file name
    pub fn for_name(&self, name: &str) -> Option<&str> {
        self.entries
            .get(Self::extension_key(name))
            .map(String::as_str)
    }

    /// Number of mapped extensions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no extension is mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MimeTypeTable {
    fn default() -> Self {
        Self::empty().with_overrides(DEFAULT_MIME_TYPES.iter().copied())
    }
}

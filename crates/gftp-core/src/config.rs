//! Configuration module for gftp.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::MimeTypeTable;
use crate::usecases::StorageSettings;

/// Drive v3 REST endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Drive v3 media upload endpoint
pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// Full Drive access, required to list and delete files the tool did not create
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Drive rejects `pageSize` values above this
const MAX_PAGE_SIZE: u32 = 1000;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for gftp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    /// Extra or replacement extension -> MIME type mappings.
    pub mime_types: BTreeMap<String, String>,
}

/// Authentication / OAuth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// OAuth client secret JSON downloaded from the Google Cloud console.
    pub client_secret_file: PathBuf,
    /// Cache of the last obtained credential.
    pub token_file: PathBuf,
    /// OAuth scopes to request.
    pub scopes: Vec<String>,
    /// Loopback port for the redirect listener; `0` picks a free port.
    pub callback_port: u16,
}

/// Remote storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum number of files returned by `ls`.
    pub page_size: u32,
    /// How downloads pick between raw transfer and export.
    pub download_policy: DownloadPolicy,
    /// What to do when several files share the requested name.
    pub name_resolution: NameResolution,
    /// Drive REST base URL.
    pub api_base_url: String,
    /// Drive upload base URL.
    pub upload_base_url: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Download transfer policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadPolicy {
    /// Export Google-native documents, fetch everything else raw.
    #[default]
    Auto,
    /// Always fetch stored bytes unconverted.
    Raw,
    /// Always request an export to the destination's format.
    Export,
}

impl fmt::Display for DownloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Raw => "raw",
            Self::Export => "export",
        };
        f.write_str(s)
    }
}

/// Name collision handling for lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameResolution {
    /// Act on the first match in service order.
    #[default]
    FirstMatch,
    /// Fail when more than one file has the name.
    RequireUnique,
}

impl fmt::Display for NameResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FirstMatch => "first_match",
            Self::RequireUnique => "require_unique",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Directory holding gftp's config, client secret and token cache.
    ///
    /// Typically `$XDG_CONFIG_HOME/gftp` on Linux.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("gftp")
    }

    /// Platform-appropriate default path for the configuration file.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// The built-in MIME table with the `mime_types` section applied on top.
    pub fn mime_table(&self) -> MimeTypeTable {
        MimeTypeTable::default().with_overrides(self.mime_types.clone())
    }

    /// Settings handed to the remote file operations.
    pub fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            page_size: self.storage.page_size,
            download_policy: self.storage.download_policy,
            name_resolution: self.storage.name_resolution,
            mime_types: self.mime_table(),
        }
    }
}

impl AuthConfig {
    /// Client secret path with a leading `~` expanded.
    pub fn client_secret_path(&self) -> PathBuf {
        expand_tilde(&self.client_secret_file)
    }

    /// Token cache path with a leading `~` expanded.
    pub fn token_path(&self) -> PathBuf {
        expand_tilde(&self.token_file)
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for AuthConfig {
    fn default() -> Self {
        let dir = Config::config_dir();
        Self {
            client_secret_file: dir.join("creds.json"),
            token_file: dir.join("token.json"),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            callback_port: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            download_policy: DownloadPolicy::default(),
            name_resolution: NameResolution::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"storage.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- auth ---
        if self.auth.scopes.is_empty() {
            errors.push(ValidationError {
                field: "auth.scopes".into(),
                message: "at least one scope is required".into(),
            });
        }
        if self.auth.token_file.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "auth.token_file".into(),
                message: "must not be empty".into(),
            });
        }

        // --- storage ---
        if self.storage.page_size == 0 || self.storage.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "storage.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        for (field, value) in [
            ("storage.api_base_url", &self.storage.api_base_url),
            ("storage.upload_base_url", &self.storage.upload_base_url),
        ] {
            if let Some(message) = check_http_url(value) {
                errors.push(ValidationError {
                    field: field.into(),
                    message,
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- mime_types ---
        for (ext, mime) in &self.mime_types {
            if ext.is_empty() || ext.contains('.') {
                errors.push(ValidationError {
                    field: format!("mime_types.{ext}"),
                    message: "extension must be non-empty and without dots".into(),
                });
            }
            if !mime.contains('/') {
                errors.push(ValidationError {
                    field: format!("mime_types.{ext}"),
                    message: format!("'{mime}' is not a MIME type"),
                });
            }
        }

        errors
    }
}

fn check_http_url(value: &str) -> Option<String> {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => None,
        Ok(url) => Some(format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => Some(format!("invalid URL '{value}': {e}")),
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use gftp_core::config::{ConfigBuilder, DownloadPolicy};
///
/// let config = ConfigBuilder::new()
///     .page_size(25)
///     .download_policy(DownloadPolicy::Raw)
///     .logging_level("debug")
///     .build();
/// assert_eq!(config.storage.page_size, 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self::default()
    }

    // --- auth ---

    pub fn client_secret_file(mut self, path: PathBuf) -> Self {
        self.config.auth.client_secret_file = path;
        self
    }

    pub fn token_file(mut self, path: PathBuf) -> Self {
        self.config.auth.token_file = path;
        self
    }

    pub fn callback_port(mut self, port: u16) -> Self {
        self.config.auth.callback_port = port;
        self
    }

    // --- storage ---

    pub fn page_size(mut self, n: u32) -> Self {
        self.config.storage.page_size = n;
        self
    }

    pub fn download_policy(mut self, policy: DownloadPolicy) -> Self {
        self.config.storage.download_policy = policy;
        self
    }

    pub fn name_resolution(mut self, resolution: NameResolution) -> Self {
        self.config.storage.name_resolution = resolution;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.storage.api_base_url = url.into();
        self
    }

    pub fn upload_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.storage.upload_base_url = url.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- mime_types ---

    pub fn mime_type(mut self, ext: impl Into<String>, mime: impl Into<String>) -> Self {
        self.config.mime_types.insert(ext.into(), mime.into());
        self
    }

    /// Consume the builder and return the final [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

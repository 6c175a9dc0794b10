//! CLI subcommands
//!
//! - [`files`] - `ls`, `dcp`, `ucp` and `rm`
//! - [`auth`] - `auth login`, `auth logout`, `auth status`

pub mod auth;
pub mod files;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use gftp_core::config::Config;
use gftp_core::domain::StorageError;
use gftp_core::ports::ICredentialProvider;
use gftp_core::usecases::RemoteFileOperations;
use gftp_drive::{DriveClient, DriveCredentialProvider, DriveStorage};
use tracing::debug;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Everything a command needs from the global flags and configuration
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn credential_provider(&self) -> DriveCredentialProvider {
        DriveCredentialProvider::new(&self.config.auth)
    }

    /// Obtains a credential and builds the file operations over Drive
    ///
    /// Returns `Ok(None)` after printing the reason when authorization fails.
    pub async fn connect(&self, fmt: &dyn OutputFormatter) -> Result<Option<RemoteFileOperations>> {
        let provider = self.credential_provider();
        let credential = match provider.valid_credential().await {
            Ok(credential) => credential,
            Err(e) => {
                fmt.error(&format!("Authentication failed: {e:#}"));
                return Ok(None);
            }
        };

        let storage = &self.config.storage;
        let client = DriveClient::with_base_urls(
            credential.access_token,
            storage.api_base_url.as_str(),
            storage.upload_base_url.as_str(),
        )
        .context("Failed to create Drive client")?;

        Ok(Some(RemoteFileOperations::new(
            Arc::new(DriveStorage::new(client)),
            self.config.storage_settings(),
        )))
    }
}

/// Prints an operation failure and returns the failing exit code
///
/// Any "nothing matched" outcome is reported as `No files found.`.
pub fn report_failure(fmt: &dyn OutputFormatter, err: &StorageError) -> ExitCode {
    debug!(error = ?err, "Operation failed");
    if err.is_not_found() {
        fmt.failure(&StorageError::NoFilesFound.to_string());
    } else {
        fmt.failure(&err.to_string());
    }
    ExitCode::FAILURE
}

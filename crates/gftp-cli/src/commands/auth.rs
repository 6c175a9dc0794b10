//! Auth commands - Login, Logout, and Status for Google Drive authorization
//!
//! 1. `login`  - Runs the OAuth2 PKCE flow and writes the token cache.
//! 2. `logout` - Deletes the token cache.
//! 3. `status` - Shows whether a cached credential exists and when it expires.

use std::process::ExitCode;

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use tracing::info;

use super::CommandContext;
use crate::output::{OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authorize gftp with Google Drive via OAuth2, even if a token is cached
    Login,
    /// Remove the cached credential
    Logout,
    /// Check authorization status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let fmt = ctx.formatter();
        match self {
            AuthCommand::Login => self.execute_login(ctx, &*fmt).await,
            AuthCommand::Logout => self.execute_logout(ctx, &*fmt),
            AuthCommand::Status => self.execute_status(ctx, &*fmt),
        }
    }

    async fn execute_login(&self, ctx: &CommandContext, fmt: &dyn OutputFormatter) -> Result<ExitCode> {
        let provider = ctx.credential_provider();
        fmt.info("Opening browser for Google authorization...");

        match provider.login().await {
            Ok(credential) => {
                info!(expires_at = %credential.expires_at, "Login completed");
                fmt.success(&format!(
                    "Authorized; token cached at {}",
                    provider.token_storage().path().display()
                ));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                fmt.error(&format!("Authentication failed: {e}"));
                Ok(ExitCode::FAILURE)
            }
        }
    }

    fn execute_logout(&self, ctx: &CommandContext, fmt: &dyn OutputFormatter) -> Result<ExitCode> {
        let provider = ctx.credential_provider();
        match provider.logout() {
            Ok(true) => fmt.success("Logged out; cached credential removed"),
            Ok(false) => fmt.success("Not logged in; nothing to remove"),
            Err(e) => {
                fmt.error(&e.to_string());
                return Ok(ExitCode::FAILURE);
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn execute_status(&self, ctx: &CommandContext, fmt: &dyn OutputFormatter) -> Result<ExitCode> {
        let provider = ctx.credential_provider();
        let token_path = provider.token_storage().path().display().to_string();

        let cached = match provider.cached() {
            Ok(cached) => cached,
            Err(e) => {
                fmt.error(&e.to_string());
                return Ok(ExitCode::FAILURE);
            }
        };

        match cached {
            Some(credential) => {
                let expired = credential.is_expired();
                let can_refresh = credential.can_refresh();
                if ctx.format == OutputFormat::Human {
                    if expired {
                        fmt.success("Logged in (access token expired)");
                    } else {
                        let minutes = (credential.expires_at - Utc::now()).num_minutes();
                        fmt.success(&format!(
                            "Logged in (access token valid for {minutes} more minutes)"
                        ));
                    }
                }
                fmt.info(&format!("Token cache: {token_path}"));
                fmt.info(&format!(
                    "Refresh token: {}",
                    if can_refresh { "present" } else { "absent" }
                ));
                fmt.print_json(&json!({
                    "logged_in": true,
                    "expired": expired,
                    "expires_at": credential.expires_at.to_rfc3339(),
                    "can_refresh": can_refresh,
                    "token_file": token_path,
                }));
            }
            None => {
                fmt.info("Not logged in. Run 'gftp auth login' to authorize.");
                fmt.print_json(&json!({
                    "logged_in": false,
                    "token_file": token_path,
                }));
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}

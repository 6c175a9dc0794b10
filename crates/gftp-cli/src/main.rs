//! gftp - Copy files to and from Google Drive
//!
//! Provides commands for:
//! - Listing files
//! - Downloading and exporting files by name
//! - Uploading local files
//! - Removing files by name
//! - Managing the cached authorization

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gftp_core::config::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    auth::AuthCommand,
    files::{DcpCommand, LsCommand, RmCommand, UcpCommand},
    CommandContext,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "gftp",
    version,
    about = "Copy files to and from Google Drive",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging on stderr (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List files in Drive
    Ls(LsCommand),
    /// Download a Drive file to a local path
    Dcp(DcpCommand),
    /// Upload a local file to Drive
    Ucp(UcpCommand),
    /// Delete a Drive file
    Rm(RmCommand),
    /// Authorization commands
    #[command(subcommand)]
    Auth(AuthCommand),
}

/// Loads the configuration file
///
/// An explicit `--config` path must exist. The default path is optional,
/// but a file that is present and malformed is still an error.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let path = Config::default_path();
            if path.exists() {
                Config::load(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Log filter: `RUST_LOG`, then `-v`/`-vv`, then `logging.level`
fn log_filter(verbose: u8, configured: &str) -> EnvFilter {
    let level = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let fmt = get_formatter(format, cli.quiet);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            fmt.error(&format!("{e:#}"));
            return Ok(ExitCode::FAILURE);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for error in &errors {
            fmt.error(&format!("Invalid configuration: {error}"));
        }
        return Ok(ExitCode::FAILURE);
    }

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, &config.logging.level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    debug!(command = ?cli.command, "Starting");

    let ctx = CommandContext {
        config,
        format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Ls(cmd) => cmd.execute(&ctx).await,
        Commands::Dcp(cmd) => cmd.execute(&ctx).await,
        Commands::Ucp(cmd) => cmd.execute(&ctx).await,
        Commands::Rm(cmd) => cmd.execute(&ctx).await,
        Commands::Auth(cmd) => cmd.execute(&ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let quiet = cli.quiet;

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            get_formatter(format, quiet).error(&format!("An error occurred: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

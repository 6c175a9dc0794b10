//! File commands - `ls`, `dcp`, `ucp` and `rm`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{report_failure, CommandContext};
use crate::output::OutputFormat;

/// List files
#[derive(Debug, Args)]
#[command(after_help = "Example: gftp ls")]
pub struct LsCommand {
    /// Maximum number of files to list (defaults to storage.page_size)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub limit: Option<u32>,
}

impl LsCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let fmt = ctx.formatter();
        let Some(ops) = ctx.connect(&*fmt).await? else {
            return Ok(ExitCode::FAILURE);
        };

        match ops.list_files(self.limit).await {
            Ok(files) => {
                fmt.line("Files:");
                for file in &files {
                    fmt.line(&file.to_string());
                }
                fmt.print_json(&json!({ "files": files }));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(report_failure(&*fmt, &e)),
        }
    }
}

/// Download a file by name
#[derive(Debug, Args)]
#[command(after_help = "Example: gftp dcp 'hello world' ../download.txt")]
pub struct DcpCommand {
    /// Name of the remote file
    pub remote_name: String,
    /// Local path to save to; its extension picks the export format
    pub destination: PathBuf,
}

impl DcpCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let fmt = ctx.formatter();
        let Some(ops) = ctx.connect(&*fmt).await? else {
            return Ok(ExitCode::FAILURE);
        };

        let show_progress = ctx.format == OutputFormat::Human && !ctx.quiet;
        let mut progress = |percent: u8| {
            if show_progress {
                println!("Download {percent}");
            }
        };

        match ops
            .download(&self.remote_name, &self.destination, &mut progress)
            .await
        {
            Ok(report) => {
                fmt.line("File Downloaded");
                fmt.print_json(&json!({
                    "success": true,
                    "id": report.file.id,
                    "name": report.file.name,
                    "destination": self.destination.display().to_string(),
                    "bytes": report.bytes_written,
                    "exported_as": report.exported_as,
                }));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(report_failure(&*fmt, &e)),
        }
    }
}

/// Upload a local file
#[derive(Debug, Args)]
#[command(after_help = "Example: gftp ucp ../download.txt")]
pub struct UcpCommand {
    /// Local file to upload; the remote name is its final path segment
    pub source: PathBuf,
}

impl UcpCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let fmt = ctx.formatter();
        let Some(ops) = ctx.connect(&*fmt).await? else {
            return Ok(ExitCode::FAILURE);
        };

        match ops.upload(&self.source).await {
            Ok(file) => {
                match ctx.format {
                    OutputFormat::Human => {
                        fmt.success(&format!("Uploaded {} ({})", file.name, file.id))
                    }
                    OutputFormat::Json => fmt.print_json(&json!({ "success": true, "file": file })),
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(report_failure(&*fmt, &e)),
        }
    }
}

/// Delete a file by name
#[derive(Debug, Args)]
#[command(after_help = "Example: gftp rm 'hello world'")]
pub struct RmCommand {
    /// Name of the remote file
    pub remote_name: String,
}

impl RmCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<ExitCode> {
        let fmt = ctx.formatter();
        let Some(ops) = ctx.connect(&*fmt).await? else {
            return Ok(ExitCode::FAILURE);
        };

        match ops.remove(&self.remote_name).await {
            Ok(file) => {
                match ctx.format {
                    OutputFormat::Human => {
                        fmt.success(&format!("Removed {} ({})", file.name, file.id))
                    }
                    OutputFormat::Json => fmt.print_json(&json!({ "success": true, "file": file })),
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(report_failure(&*fmt, &e)),
        }
    }
}

//! Output formatting for the inspection commands

use clap::ValueEnum;
use colored::Colorize;
use serde_json::json;

use crate::error::{FossDriverError, ParseError};
use crate::parser::{LicenseSummary, ParsedUpload};

/// Output format for `find` and `stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    Terminal,
    /// Pretty-printed JSON
    Json,
}

fn to_json(value: &serde_json::Value) -> Result<String, FossDriverError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        ParseError::Json {
            page: "output".to_string(),
            source: e,
        }
        .into()
    })
}

/// Render a folder and its uploads
pub fn render_uploads(
    format: OutputFormat,
    folder: &str,
    folder_id: u64,
    uploads: &[ParsedUpload],
) -> Result<String, FossDriverError> {
    match format {
        OutputFormat::Json => to_json(&json!({
            "folder": folder,
            "folderId": folder_id,
            "uploads": uploads,
        })),
        OutputFormat::Terminal => {
            let mut out = format!(
                "{} {} {}\n",
                "Folder".bold(),
                folder.cyan(),
                format!("(id {})", folder_id).dimmed()
            );
            if uploads.is_empty() {
                out.push_str(&format!("  {}\n", "no matching uploads".yellow()));
            }
            for upload in uploads {
                let item = upload
                    .top_tree_item_id
                    .map(|id| format!(", item {}", id))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "  {} {}\n",
                    upload.name,
                    format!("(id {}{})", upload.id, item).dimmed()
                ));
            }
            Ok(out)
        }
    }
}

/// Render the license summary of an upload
pub fn render_summary(
    format: OutputFormat,
    upload: &ParsedUpload,
    summary: &LicenseSummary,
) -> Result<String, FossDriverError> {
    match format {
        OutputFormat::Json => to_json(&json!({
            "upload": upload.name,
            "uploadId": upload.id,
            "summary": summary,
        })),
        OutputFormat::Terminal => {
            let width = summary
                .entries()
                .iter()
                .map(|(label, _)| label.len())
                .max()
                .unwrap_or(0);
            let mut out = format!("{} {}\n", "License summary for".bold(), upload.name.cyan());
            for (label, value) in summary.entries() {
                out.push_str(&format!("  {:<width$}  {}\n", label, value, width = width));
            }
            Ok(out)
        }
    }
}

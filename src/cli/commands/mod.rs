//! CLI commands module

pub mod find;
pub mod stats;
pub mod task;
pub mod version;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::output::OutputFormat;
use crate::config::FossConfig;
use crate::error::FossDriverError;
use crate::server::{FossServer, HttpTransport};
use crate::tasks::{
    ActionKind, BulkTextMatch, Copyright, CreateFolder, ImportRdf, Reuse, Scanners, SpdxExport,
    Task, Upload,
};

/// Arguments naming an upload inside a folder
#[derive(Args, Debug)]
pub struct UploadRefArgs {
    /// Name of the upload as shown by the server
    #[arg(value_name = "UPLOAD")]
    pub upload: String,

    /// Folder containing the upload
    #[arg(short, long)]
    pub folder: String,
}

/// Arguments for the find command
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Folder to look in
    #[arg(value_name = "FOLDER")]
    pub folder: String,

    /// Upload to look for; lists every upload of the folder when omitted
    #[arg(short, long)]
    pub upload: Option<String>,

    /// Match uploads whose name contains UPLOAD instead of equalling it
    #[arg(long)]
    pub contains: bool,

    /// Output format
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub target: UploadRefArgs,

    /// Output format
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Arguments for the create-folder command
#[derive(Args, Debug)]
pub struct CreateFolderArgs {
    /// Name of the new folder
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Existing parent folder
    #[arg(short, long, default_value = "Software Repository")]
    pub parent: String,
}

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Archive to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Destination folder
    #[arg(short, long)]
    pub folder: String,
}

/// Arguments for the reuse command
#[derive(Args, Debug)]
pub struct ReuseArgs {
    #[command(flatten)]
    pub target: UploadRefArgs,

    /// Upload whose decisions are reused
    #[arg(long, value_name = "UPLOAD")]
    pub old_upload: String,

    /// Folder of the reused upload
    #[arg(long, value_name = "FOLDER")]
    pub old_folder: String,
}

/// A license action given on the command line as `add=NAME` or `remove=NAME`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseActionArg {
    pub kind: ActionKind,
    pub license: String,
}

/// Parse `add=NAME` / `remove=NAME`
pub fn parse_license_action(value: &str) -> Result<LicenseActionArg, String> {
    let (kind, license) = value
        .split_once('=')
        .ok_or_else(|| format!("expected add=LICENSE or remove=LICENSE, got '{}'", value))?;
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "add" => ActionKind::Add,
        "remove" => ActionKind::Remove,
        other => return Err(format!("unknown action '{}', expected add or remove", other)),
    };
    let license = license.trim();
    if license.is_empty() {
        return Err("license name must not be empty".to_string());
    }
    Ok(LicenseActionArg {
        kind,
        license: license.to_string(),
    })
}

/// Arguments for the bulk-match command
#[derive(Args, Debug)]
pub struct BulkMatchArgs {
    #[command(flatten)]
    pub target: UploadRefArgs,

    /// Literal text to search for
    #[arg(short, long)]
    pub text: String,

    /// License action applied to every hit, in order (add=NAME or remove=NAME)
    #[arg(short, long = "action", value_name = "ACTION", value_parser = parse_license_action)]
    pub actions: Vec<LicenseActionArg>,
}

/// Arguments for the spdx-tv and spdx-rdf commands
#[derive(Args, Debug)]
pub struct SpdxArgs {
    #[command(flatten)]
    pub target: UploadRefArgs,

    /// File the report is written to
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

/// Arguments for the import-rdf command
#[derive(Args, Debug)]
pub struct ImportRdfArgs {
    /// SPDX RDF document to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub target: UploadRefArgs,
}

impl From<CreateFolderArgs> for Task {
    fn from(args: CreateFolderArgs) -> Self {
        CreateFolder::new(args.name, args.parent).into()
    }
}

impl From<UploadArgs> for Task {
    fn from(args: UploadArgs) -> Self {
        Upload::new(args.file, args.folder).into()
    }
}

impl From<ReuseArgs> for Task {
    fn from(args: ReuseArgs) -> Self {
        Reuse::new(
            args.target.upload,
            args.target.folder,
            args.old_upload,
            args.old_folder,
        )
        .into()
    }
}

impl From<BulkMatchArgs> for Task {
    fn from(args: BulkMatchArgs) -> Self {
        let mut task = BulkTextMatch::new(args.target.upload, args.target.folder, args.text);
        for action in args.actions {
            match action.kind {
                ActionKind::Add => task.add(action.license),
                ActionKind::Remove => task.remove(action.license),
            };
        }
        task.into()
    }
}

impl From<ImportRdfArgs> for Task {
    fn from(args: ImportRdfArgs) -> Self {
        ImportRdf::new(args.file, args.target.upload, args.target.folder).into()
    }
}

pub fn scanners_task(args: UploadRefArgs) -> Task {
    Scanners::new(args.upload, args.folder).into()
}

pub fn copyright_task(args: UploadRefArgs) -> Task {
    Copyright::new(args.upload, args.folder).into()
}

pub fn spdx_export(args: SpdxArgs) -> SpdxExport {
    SpdxExport::new(args.target.upload, args.target.folder, args.output)
}

/// Spinner shown on stderr while waiting for the server
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Load the configuration and log in
pub(crate) async fn connect(
    config_path: Option<&Path>,
) -> Result<FossServer<HttpTransport>, FossDriverError> {
    let config = FossConfig::load(config_path)?;
    let server_url = config.server_url.clone();

    let progress = spinner(format!("Logging in to {}...", server_url));
    let server = FossServer::connect_http(config).await;
    progress.finish_and_clear();

    let server = server?;
    eprintln!(
        "{} {} (version {})",
        "Connected:".green().bold(),
        server_url.cyan(),
        server.server_version()
    );
    Ok(server)
}

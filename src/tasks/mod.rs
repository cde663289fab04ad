//! # Tasks Module
//!
//! A task is one FOSSology workflow: upload an archive, run the scanners,
//! export a report, and so on. Tasks are plain values holding the names
//! they act on; the session is handed to [`Task::run`], which submits the
//! server-side job and awaits it until it reaches a terminal state.
//!
//! Names are resolved when the task runs, not when it is built, so a
//! task referencing an unknown folder, upload or license fails in `run`.
//! Running a task twice submits the job twice.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fossdriver::config::FossConfig;
//! use fossdriver::server::FossServer;
//! use fossdriver::tasks::{BulkTextMatch, Scanners, Task};
//!
//! # async fn run() -> Result<(), fossdriver::FossDriverError> {
//! let mut server = FossServer::connect_http(FossConfig::load(None)?).await?;
//!
//! Task::from(Scanners::new("burrow-1.0.tar.gz", "Burrow"))
//!     .run(&mut server)
//!     .await?;
//!
//! let mut bulk = BulkTextMatch::new("burrow-1.0.tar.gz", "Burrow", "Licensed under MIT");
//! bulk.add("MIT").remove("NOASSERTION");
//! Task::from(bulk).run(&mut server).await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod report;
pub mod scan;
pub mod upload;

pub use bulk::{ActionKind, ActionTuple, BulkTextMatch};
pub use report::{ImportRdf, SpdxExport};
pub use scan::{Copyright, Reuse, Scanners};
pub use upload::{CreateFolder, Upload};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FossDriverError;
use crate::server::{FossServer, PollOptions, SpdxFormat, Transport};

/// What a successful run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The job finished; nothing to hand back
    Completed,
    /// A new upload was created and unpacked
    Uploaded { upload_id: u64 },
    /// A report was downloaded to `path`
    ReportWritten { path: PathBuf },
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Completed => write!(f, "completed"),
            TaskOutcome::Uploaded { upload_id } => write!(f, "uploaded as id {}", upload_id),
            TaskOutcome::ReportWritten { path } => write!(f, "report written to {}", path.display()),
        }
    }
}

/// Every workflow fossdriver can drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    CreateFolder(CreateFolder),
    Upload(Upload),
    Scanners(Scanners),
    Copyright(Copyright),
    Reuse(Reuse),
    BulkTextMatch(BulkTextMatch),
    SpdxTv(SpdxExport),
    SpdxRdf(SpdxExport),
    ImportRdf(ImportRdf),
}

impl Task {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Task::CreateFolder(_) => "CreateFolder",
            Task::Upload(_) => "Upload",
            Task::Scanners(_) => "Scanners",
            Task::Copyright(_) => "Copyright",
            Task::Reuse(_) => "Reuse",
            Task::BulkTextMatch(_) => "BulkTextMatch",
            Task::SpdxTv(_) => "SPDXTV",
            Task::SpdxRdf(_) => "SPDXRDF",
            Task::ImportRdf(_) => "ImportRDF",
        }
    }

    /// Run the workflow against `server`, awaiting the server-side job
    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        tracing::info!("Running task: {}", self);
        match self {
            Task::CreateFolder(task) => task.run(server).await,
            Task::Upload(task) => task.run(server).await,
            Task::Scanners(task) => task.run(server).await,
            Task::Copyright(task) => task.run(server).await,
            Task::Reuse(task) => task.run(server).await,
            Task::BulkTextMatch(task) => task.run(server).await,
            Task::SpdxTv(task) => task.run(server, SpdxFormat::TagValue).await,
            Task::SpdxRdf(task) => task.run(server, SpdxFormat::Rdf).await,
            Task::ImportRdf(task) => task.run(server).await,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::CreateFolder(t) => write!(
                f,
                "{} (new folder {}, parent folder {})",
                self.name(),
                t.new_folder_name,
                t.parent_folder_name
            ),
            Task::Upload(t) => write!(
                f,
                "{} (file {}, folder {})",
                self.name(),
                t.file_path.display(),
                t.folder_name
            ),
            Task::Scanners(t) => write!(f, "{} (upload {}, folder {})", self.name(), t.upload_name, t.folder_name),
            Task::Copyright(t) => write!(f, "{} (upload {}, folder {})", self.name(), t.upload_name, t.folder_name),
            Task::Reuse(t) => write!(
                f,
                "{} (old: upload {}, folder {}; new: upload {}, folder {})",
                self.name(),
                t.old_upload_name,
                t.old_folder_name,
                t.new_upload_name,
                t.new_folder_name
            ),
            Task::BulkTextMatch(t) => write!(
                f,
                "{} (upload {}, folder {}, {} action(s))",
                self.name(),
                t.upload_name,
                t.folder_name,
                t.actions().len()
            ),
            Task::SpdxTv(t) | Task::SpdxRdf(t) => write!(
                f,
                "{} (upload {}, folder {}) to file {}",
                self.name(),
                t.upload_name,
                t.folder_name,
                t.out_path.display()
            ),
            Task::ImportRdf(t) => write!(
                f,
                "{} ({} into upload {}, folder {})",
                self.name(),
                t.rdf_path.display(),
                t.upload_name,
                t.folder_name
            ),
        }
    }
}

macro_rules! impl_from_task {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Task {
                fn from(task: $variant) -> Self {
                    Task::$variant(task)
                }
            }
        )*
    };
}

impl_from_task!(CreateFolder, Upload, Scanners, Copyright, Reuse, BulkTextMatch, ImportRdf);

/// Poll every `seconds`, bounded by the configured job timeout
fn poll_every<T: Transport>(server: &FossServer<T>, seconds: u64) -> PollOptions {
    PollOptions::every(Duration::from_secs(seconds)).with_timeout(server.config().job_timeout())
}

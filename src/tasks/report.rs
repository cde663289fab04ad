//! SPDX export and import

use std::path::PathBuf;
use tracing::info;

use super::{poll_every, TaskOutcome};
use crate::error::{FossDriverError, ResolveError};
use crate::server::{FossServer, SpdxFormat, Transport};

const REPORT_POLL_SECS: u64 = 5;
const IMPORT_POLL_SECS: u64 = 5;

/// Generate an SPDX report for an upload and save it locally
///
/// The same value drives both the tag-value and the RDF export; the
/// [`Task`](super::Task) variant decides the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpdxExport {
    pub upload_name: String,
    pub folder_name: String,
    pub out_path: PathBuf,
}

impl SpdxExport {
    pub fn new(
        upload_name: impl Into<String>,
        folder_name: impl Into<String>,
        out_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            upload_name: upload_name.into(),
            folder_name: folder_name.into(),
            out_path: out_path.into(),
        }
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
        format: SpdxFormat,
    ) -> Result<TaskOutcome, FossDriverError> {
        let upload = server
            .resolve_upload(&self.folder_name, &self.upload_name, true)
            .await?;
        let agent = format.agent();

        info!(
            "Running {} agent on upload {} ({})",
            agent, self.upload_name, upload.id
        );
        server.start_spdx_report(upload.id, format).await?;

        let poll = poll_every(server, REPORT_POLL_SECS);
        server.wait_until_agent_is_done(upload.id, agent, poll).await?;

        server
            .download_spdx_report(upload.id, format, &self.out_path)
            .await?;
        Ok(TaskOutcome::ReportWritten {
            path: self.out_path.clone(),
        })
    }
}

/// Import an SPDX RDF document as license decisions on an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRdf {
    pub rdf_path: PathBuf,
    pub upload_name: String,
    pub folder_name: String,
}

impl ImportRdf {
    pub fn new(
        rdf_path: impl Into<PathBuf>,
        upload_name: impl Into<String>,
        folder_name: impl Into<String>,
    ) -> Self {
        Self {
            rdf_path: rdf_path.into(),
            upload_name: upload_name.into(),
            folder_name: folder_name.into(),
        }
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let folder_id = server.folder_id(&self.folder_name).await?;
        let upload = server
            .find_upload(folder_id, &self.upload_name, true)
            .await?
            .ok_or_else(|| ResolveError::UploadNotFound {
                name: self.upload_name.clone(),
                folder: self.folder_name.clone(),
            })?;

        info!(
            "Importing {} into upload {} ({})",
            self.rdf_path.display(),
            self.upload_name,
            upload.id
        );
        server
            .start_rdf_import(&self.rdf_path, folder_id, upload.id)
            .await?;

        let poll = poll_every(server, IMPORT_POLL_SECS);
        server
            .wait_until_agent_is_done(upload.id, "reportImport", poll)
            .await?;

        Ok(TaskOutcome::Completed)
    }
}

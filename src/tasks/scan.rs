//! Scanner and decision-reuse tasks

use tracing::info;

use super::{poll_every, TaskOutcome};
use crate::error::FossDriverError;
use crate::server::{FossServer, Transport};

const SCANNER_POLL_SECS: u64 = 10;
const COPYRIGHT_POLL_SECS: u64 = 5;
const REUSER_POLL_SECS: u64 = 5;

/// Run the monk and nomos license scanners on an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanners {
    pub upload_name: String,
    pub folder_name: String,
}

impl Scanners {
    pub fn new(upload_name: impl Into<String>, folder_name: impl Into<String>) -> Self {
        Self {
            upload_name: upload_name.into(),
            folder_name: folder_name.into(),
        }
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let upload = server
            .resolve_upload(&self.folder_name, &self.upload_name, true)
            .await?;

        info!(
            "Running monk and nomos scanners on upload {} ({})",
            self.upload_name, upload.id
        );
        server.start_monk_and_nomos(upload.id).await?;

        info!(
            "Waiting for monk and nomos to finish for upload {} ({})",
            self.upload_name, upload.id
        );
        let poll = poll_every(server, SCANNER_POLL_SECS);
        server.wait_until_agent_is_done(upload.id, "monk", poll).await?;
        server.wait_until_agent_is_done(upload.id, "nomos", poll).await?;

        Ok(TaskOutcome::Completed)
    }
}

/// Run the copyright agent on an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Copyright {
    pub upload_name: String,
    pub folder_name: String,
}

impl Copyright {
    pub fn new(upload_name: impl Into<String>, folder_name: impl Into<String>) -> Self {
        Self {
            upload_name: upload_name.into(),
            folder_name: folder_name.into(),
        }
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let upload = server
            .resolve_upload(&self.folder_name, &self.upload_name, true)
            .await?;

        info!(
            "Running copyright agent on upload {} ({})",
            self.upload_name, upload.id
        );
        server.start_copyright(upload.id).await?;

        let poll = poll_every(server, COPYRIGHT_POLL_SECS);
        server
            .wait_until_agent_is_done(upload.id, "copyright", poll)
            .await?;

        Ok(TaskOutcome::Completed)
    }
}

/// Copy clearing decisions from an earlier upload onto a new one
///
/// Both uploads are matched by exact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reuse {
    pub new_upload_name: String,
    pub new_folder_name: String,
    pub old_upload_name: String,
    pub old_folder_name: String,
}

impl Reuse {
    pub fn new(
        new_upload_name: impl Into<String>,
        new_folder_name: impl Into<String>,
        old_upload_name: impl Into<String>,
        old_folder_name: impl Into<String>,
    ) -> Self {
        Self {
            new_upload_name: new_upload_name.into(),
            new_folder_name: new_folder_name.into(),
            old_upload_name: old_upload_name.into(),
            old_folder_name: old_folder_name.into(),
        }
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let old = server
            .resolve_upload(&self.old_folder_name, &self.old_upload_name, true)
            .await?;
        let new = server
            .resolve_upload(&self.new_folder_name, &self.new_upload_name, true)
            .await?;

        info!(
            "Running reuser agent on upload {} ({}) reusing old upload {} ({})",
            self.new_upload_name, new.id, self.old_upload_name, old.id
        );
        server.start_reuser(new.id, old.id).await?;

        let poll = poll_every(server, REUSER_POLL_SECS);
        server.wait_until_agent_is_done(new.id, "reuser", poll).await?;

        Ok(TaskOutcome::Completed)
    }
}

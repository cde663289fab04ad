//! Folder creation and archive upload

use std::path::PathBuf;
use tracing::info;

use super::{poll_every, TaskOutcome};
use crate::error::{FossDriverError, JobError, ResolveError};
use crate::server::{FossServer, Transport};

const UNPACK_POLL_SECS: u64 = 5;

/// Create a folder below an existing parent folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFolder {
    pub new_folder_name: String,
    pub parent_folder_name: String,
}

impl CreateFolder {
    pub fn new(new_folder_name: impl Into<String>, parent_folder_name: impl Into<String>) -> Self {
        Self {
            new_folder_name: new_folder_name.into(),
            parent_folder_name: parent_folder_name.into(),
        }
    }

    /// Create the folder, then check that the server lists a new folder of that name
    ///
    /// Folder creation is immediate on the server; there is no job to wait for.
    /// The selector does not show parents, so a refused creation next to an
    /// existing folder of the same name is told apart by id.
    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let before = server.folders().await?;
        let parent_id = before
            .iter()
            .find(|f| f.name == self.parent_folder_name)
            .map(|f| f.id)
            .ok_or_else(|| ResolveError::FolderNotFound {
                name: self.parent_folder_name.clone(),
            })?;

        info!(
            "Creating folder {} in parent folder {} ({})",
            self.new_folder_name, self.parent_folder_name, parent_id
        );
        server
            .create_folder(parent_id, &self.new_folder_name, &self.new_folder_name)
            .await?;

        let after = server.folders().await?;
        let created = after.iter().find(|f| {
            f.name == self.new_folder_name && before.iter().all(|old| old.id != f.id)
        });
        match created {
            Some(folder) => {
                info!("Folder {} created with id {}", self.new_folder_name, folder.id);
                Ok(TaskOutcome::Completed)
            }
            None => Err(JobError::FolderNotCreated {
                name: self.new_folder_name.clone(),
            }
            .into()),
        }
    }
}

/// Upload a local archive into a folder and wait for it to unpack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_path: PathBuf,
    pub folder_name: String,
}

impl Upload {
    pub fn new(file_path: impl Into<PathBuf>, folder_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            folder_name: folder_name.into(),
        }
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let folder_id = server.folder_id(&self.folder_name).await?;

        info!(
            "Uploading {} to folder {} ({})",
            self.file_path.display(),
            self.folder_name,
            folder_id
        );
        let upload_id = server.upload_file(&self.file_path, folder_id).await?;
        info!(
            "Upload complete, {} upload ID number is {}",
            self.file_path.display(),
            upload_id
        );

        info!("Waiting for upload {} to unpack", upload_id);
        let poll = poll_every(server, UNPACK_POLL_SECS);
        server
            .wait_until_agent_is_done(upload_id, "ununpack", poll)
            .await?;
        server
            .wait_until_agent_is_done(upload_id, "adj2nest", poll)
            .await?;

        Ok(TaskOutcome::Uploaded { upload_id })
    }
}

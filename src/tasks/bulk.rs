//! Bulk text match
//!
//! A bulk text match asks the `monkbulk` agent to find every file of an
//! upload containing a literal text, and to add or remove licenses on each
//! hit. Actions are collected on the task and submitted in the order they
//! were added.

use std::fmt;
use tracing::info;

use super::{poll_every, TaskOutcome};
use crate::error::{FossDriverError, ParseError, ResolveError};
use crate::parser::{ParsedLicense, ServerVersion};
use crate::server::{BulkAction, FossServer, Transport, CAPITALISED_BULK_ACTIONS_VERSION};

const MONKBULK_POLL_SECS: u64 = 5;

/// Whether a matched license is added to or removed from the hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Add,
    Remove,
}

impl ActionKind {
    /// Value the bulk form expects for this action on the given server
    pub fn form_value(&self, version: &ServerVersion) -> &'static str {
        let capitalised = version.is_at_least(CAPITALISED_BULK_ACTIONS_VERSION);
        match (self, capitalised) {
            (ActionKind::Add, true) => "Add",
            (ActionKind::Add, false) => "add",
            (ActionKind::Remove, true) => "Remove",
            (ActionKind::Remove, false) => "remove",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Add => write!(f, "add"),
            ActionKind::Remove => write!(f, "remove"),
        }
    }
}

/// One license action queued on a [`BulkTextMatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTuple {
    pub license_name: String,
    pub kind: ActionKind,
}

/// Bulk text match over one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkTextMatch {
    pub upload_name: String,
    pub folder_name: String,
    pub ref_text: String,
    actions: Vec<ActionTuple>,
}

impl BulkTextMatch {
    pub fn new(
        upload_name: impl Into<String>,
        folder_name: impl Into<String>,
        ref_text: impl Into<String>,
    ) -> Self {
        Self {
            upload_name: upload_name.into(),
            folder_name: folder_name.into(),
            ref_text: ref_text.into(),
            actions: Vec::new(),
        }
    }

    /// Queue adding `license_name` to every match
    ///
    /// The license is looked up when the task runs.
    pub fn add(&mut self, license_name: impl Into<String>) -> &mut Self {
        self.push(license_name.into(), ActionKind::Add)
    }

    /// Queue removing `license_name` from every match
    pub fn remove(&mut self, license_name: impl Into<String>) -> &mut Self {
        self.push(license_name.into(), ActionKind::Remove)
    }

    fn push(&mut self, license_name: String, kind: ActionKind) -> &mut Self {
        self.actions.push(ActionTuple { license_name, kind });
        self
    }

    /// Queued actions, oldest first
    pub fn actions(&self) -> &[ActionTuple] {
        &self.actions
    }

    /// Turn the queued actions into form rows using the server's license ids
    pub fn build_actions(
        &self,
        licenses: &[ParsedLicense],
        version: &ServerVersion,
    ) -> Result<Vec<BulkAction>, ResolveError> {
        self.actions
            .iter()
            .map(|tuple| {
                let license = licenses
                    .iter()
                    .find(|l| l.name == tuple.license_name)
                    .ok_or_else(|| ResolveError::LicenseNotFound {
                        name: tuple.license_name.clone(),
                    })?;
                Ok(BulkAction {
                    license_id: license.id,
                    license_name: license.name.clone(),
                    action: tuple.kind.form_value(version).to_string(),
                })
            })
            .collect()
    }

    pub async fn run<T: Transport>(
        &self,
        server: &mut FossServer<T>,
    ) -> Result<TaskOutcome, FossDriverError> {
        let upload = server
            .resolve_upload(&self.folder_name, &self.upload_name, true)
            .await?;
        let item_id = upload
            .top_tree_item_id
            .ok_or_else(|| ParseError::missing("upload tree item id", "browse-processPost"))?;

        let licenses = if self.actions.is_empty() {
            Vec::new()
        } else {
            let licenses = server.licenses(upload.id, item_id).await?;
            if licenses.is_empty() {
                return Err(ResolveError::NoLicenses {
                    upload: self.upload_name.clone(),
                }
                .into());
            }
            licenses
        };
        let actions = self.build_actions(&licenses, server.server_version())?;

        info!(
            "Running monkbulk agent on upload {} ({}) with {} action(s)",
            self.upload_name,
            upload.id,
            actions.len()
        );
        server
            .start_bulk_text_match(&self.ref_text, item_id, &actions)
            .await?;

        let poll = poll_every(server, MONKBULK_POLL_SECS);
        server
            .wait_until_agent_is_done(upload.id, "monkbulk", poll)
            .await?;

        Ok(TaskOutcome::Completed)
    }
}

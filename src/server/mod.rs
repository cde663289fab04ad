//! # Server Module
//!
//! [`FossServer`] owns one authenticated session against a FOSSology server
//! and exposes the logical operations the tasks are built from: resolving
//! names to ids, starting agents, reading job state and fetching reports.
//!
//! ## Session maintenance
//!
//! FOSSology answers with a "session timed out" page once the login cookie
//! expires. Every response is checked for it; the session then logs in again
//! and replays the request. More than [`MAX_LOGIN_ATTEMPTS`] consecutive
//! re-logins fail with [`SessionError::TooManyLoginAttempts`]. Transport
//! failures are never retried.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fossdriver::config::FossConfig;
//! use fossdriver::server::FossServer;
//!
//! # async fn run() -> Result<(), fossdriver::FossDriverError> {
//! let config = FossConfig::load(None)?;
//! let mut server = FossServer::connect_http(config).await?;
//! let folder = server.folder_id("Software Repository").await?;
//! println!("folder id {folder}");
//! # Ok(())
//! # }
//! ```

pub mod transport;

pub use transport::{FormPart, HttpTransport, MultipartForm, Page, Request, Transport};

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::FossConfig;
use crate::error::{FossDriverError, JobError, ResolveError, SessionError};
use crate::parser::{
    self, LicenseSummary, ParsedFolder, ParsedJob, ParsedLicense, ParsedUpload, ServerVersion,
};

/// Marker text of the page FOSSology serves for an expired session
pub const NOT_LOGGED_IN_RESPONSE: &str = "session timed out";

/// Marker text of the page FOSSology serves for rejected credentials
pub const USER_PASSWORD_NOT_FOUND: &str =
    "The combination of user name and password was not found";

/// Consecutive re-logins tolerated before giving up
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// First server release answering `showjb` with structured JSON
const JSON_JOBS_VERSION: &str = "3.5.0";

/// First server release expecting capitalised bulk actions
pub const CAPITALISED_BULK_ACTIONS_VERSION: &str = "3.6.0";

/// SPDX report flavours the server can generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpdxFormat {
    /// SPDX tag-value, produced by the `spdx2tv` agent
    TagValue,
    /// SPDX RDF/XML, produced by the `spdx2` agent
    Rdf,
}

impl SpdxFormat {
    /// Name of the agent, also used as the `outputFormat` parameter
    pub fn agent(&self) -> &'static str {
        match self {
            SpdxFormat::TagValue => "spdx2tv",
            SpdxFormat::Rdf => "spdx2",
        }
    }
}

/// One row of a bulk text match submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAction {
    pub license_id: u64,
    pub license_name: String,
    /// Action value as the server expects it (`add`, `Remove`, ...)
    pub action: String,
}

/// How often to poll a job and how long to wait at most
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Option<Duration>,
}

impl PollOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One authenticated session against a FOSSology server
pub struct FossServer<T: Transport> {
    config: FossConfig,
    transport: T,
    server_version: ServerVersion,
    login_attempts: u32,
}

impl FossServer<HttpTransport> {
    /// Connect to the configured server over HTTP and log in
    pub async fn connect_http(config: FossConfig) -> Result<Self, FossDriverError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::connect(config, transport).await
    }
}

impl<T: Transport> FossServer<T> {
    /// Log in with the configured credentials over the given transport
    ///
    /// Fails with [`SessionError::AuthenticationFailed`] before any task can
    /// run when the server rejects the credentials.
    pub async fn connect(config: FossConfig, transport: T) -> Result<Self, FossDriverError> {
        let mut server = Self {
            config,
            transport,
            server_version: ServerVersion::Unknown,
            login_attempts: 0,
        };
        server.login().await?;
        Ok(server)
    }

    /// Configuration this session was created from
    pub fn config(&self) -> &FossConfig {
        &self.config
    }

    /// Version detected at login
    pub fn server_version(&self) -> &ServerVersion {
        &self.server_version
    }

    /// Whether the server is at least `version`; unknown versions count as newest
    pub fn is_at_least_version(&self, version: &str) -> bool {
        self.server_version.is_at_least(version)
    }

    /// Log in and record the server version
    pub async fn login(&mut self) -> Result<(), FossDriverError> {
        self.authenticate().await?;
        self.server_version = self.version().await?;
        info!(
            "Logged in to {} as {} (server version {})",
            self.config.server_url, self.config.username, self.server_version
        );
        Ok(())
    }

    async fn authenticate(&self) -> Result<(), FossDriverError> {
        let request = Request::Form {
            url: self.config.endpoint_url("/repo/?mod=auth"),
            fields: vec![
                ("username".to_string(), self.config.username.clone()),
                ("password".to_string(), self.config.password.clone()),
            ],
        };
        debug!("POST: {}", request.url());
        let page = self.transport.send(&request).await?;
        if page.body.contains(USER_PASSWORD_NOT_FOUND) {
            return Err(SessionError::AuthenticationFailed {
                username: self.config.username.clone(),
            }
            .into());
        }
        check_status(&request, &page)?;
        Ok(())
    }

    /// Send a request, logging in again while the server reports a timed-out session
    async fn request(&mut self, request: Request) -> Result<Page, FossDriverError> {
        loop {
            debug!("{}: {}", request.method(), request.url());
            let page = self.transport.send(&request).await?;
            if !(page.is_success() && page.body.contains(NOT_LOGGED_IN_RESPONSE)) {
                self.login_attempts = 0;
                check_status(&request, &page)?;
                return Ok(page);
            }

            self.login_attempts += 1;
            if self.login_attempts > MAX_LOGIN_ATTEMPTS {
                tracing::error!("Unable to relogin - max login attempts exceeded");
                return Err(SessionError::TooManyLoginAttempts {
                    attempts: MAX_LOGIN_ATTEMPTS,
                }
                .into());
            }
            warn!(
                "Session timed out, logging in again (attempt {})",
                self.login_attempts
            );
            self.authenticate().await?;
        }
    }

    async fn get(&mut self, endpoint: &str) -> Result<Page, FossDriverError> {
        let url = self.config.endpoint_url(endpoint);
        self.request(Request::Get { url }).await
    }

    async fn post(
        &mut self,
        endpoint: &str,
        fields: Vec<(String, String)>,
    ) -> Result<Page, FossDriverError> {
        let url = self.config.endpoint_url(endpoint);
        self.request(Request::Form { url, fields }).await
    }

    async fn post_file(
        &mut self,
        endpoint: &str,
        form: MultipartForm,
    ) -> Result<Page, FossDriverError> {
        let url = self.config.endpoint_url(endpoint);
        self.request(Request::Multipart { url, form }).await
    }

    /// Read the server version from the landing page (no login required)
    pub async fn version(&mut self) -> Result<ServerVersion, FossDriverError> {
        let page = self.get("/repo/").await?;
        Ok(parser::parse_version_number(&page.body)?)
    }

    /// Every folder the user can upload into
    pub async fn folders(&mut self) -> Result<Vec<ParsedFolder>, FossDriverError> {
        // upload_file lists every folder the user can see
        let page = self.get("/repo/?mod=upload_file").await?;
        Ok(parser::parse_folder_list(&page.body)?)
    }

    /// Find the id of a folder by its exact (trimmed) name
    ///
    /// With several folders of that name, the first one listed wins.
    pub async fn find_folder(&mut self, folder_name: &str) -> Result<Option<u64>, FossDriverError> {
        let page = self.get("/repo/?mod=upload_file").await?;
        Ok(parser::parse_folder_number(&page.body, folder_name)?)
    }

    /// Id of the named folder, or [`ResolveError::FolderNotFound`]
    pub async fn folder_id(&mut self, folder_name: &str) -> Result<u64, FossDriverError> {
        self.find_folder(folder_name).await?.ok_or_else(|| {
            ResolveError::FolderNotFound {
                name: folder_name.to_string(),
            }
            .into()
        })
    }

    /// All uploads listed in a folder
    // TODO: page through iTotalDisplayRecords; only the first 100 uploads are read
    pub async fn uploads_in_folder(
        &mut self,
        folder_id: u64,
    ) -> Result<Vec<ParsedUpload>, FossDriverError> {
        let endpoint = format!(
            "/repo/?mod=browse-processPost&folder={}&iDisplayStart=0&iDisplayLength=100",
            folder_id
        );
        let page = self.get(&endpoint).await?;
        Ok(parser::parse_upload_list(&page.body)?)
    }

    /// First upload in the folder whose name equals (`exact`) or contains `upload_name`
    pub async fn find_upload(
        &mut self,
        folder_id: u64,
        upload_name: &str,
        exact: bool,
    ) -> Result<Option<ParsedUpload>, FossDriverError> {
        let uploads = self.uploads_in_folder(folder_id).await?;
        Ok(uploads.into_iter().find(|u| {
            if exact {
                u.name == upload_name
            } else {
                u.name.contains(upload_name)
            }
        }))
    }

    /// Resolve a folder name and upload name to the upload record
    pub async fn resolve_upload(
        &mut self,
        folder_name: &str,
        upload_name: &str,
        exact: bool,
    ) -> Result<ParsedUpload, FossDriverError> {
        let folder_id = self.folder_id(folder_name).await?;
        self.find_upload(folder_id, upload_name, exact)
            .await?
            .ok_or_else(|| {
                ResolveError::UploadNotFound {
                    name: upload_name.to_string(),
                    folder: folder_name.to_string(),
                }
                .into()
            })
    }

    /// Create a folder below `parent_folder_id`
    pub async fn create_folder(
        &mut self,
        parent_folder_id: u64,
        folder_name: &str,
        description: &str,
    ) -> Result<(), FossDriverError> {
        let fields = vec![
            ("parentid".to_string(), parent_folder_id.to_string()),
            ("newname".to_string(), folder_name.to_string()),
            ("description".to_string(), description.to_string()),
        ];
        self.post("/repo/?mod=folder_create", fields).await?;
        Ok(())
    }

    /// Upload a file into a folder without starting any scanner
    ///
    /// Returns the new upload id.
    pub async fn upload_file(
        &mut self,
        file_path: &Path,
        folder_id: u64,
    ) -> Result<u64, FossDriverError> {
        let base_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let page = self.get("/repo/?mod=upload_file").await?;
        let build_token = parser::parse_upload_form_build_token(&page.body).unwrap_or_else(|| {
            warn!("Couldn't extract uploadformbuild token");
            String::new()
        });

        let mut form = MultipartForm::new()
            .text("uploadformbuild", build_token)
            .text("folder", folder_id.to_string())
            .file("fileInput", file_path)?
            .text("descriptionInputName", base_name)
            .text("public", "private");
        for agent in [
            "bucket", "copyright", "ecc", "mimetype", "nomos", "monk", "pkgagent",
        ] {
            form = form.text(format!("Check_agent_{}", agent), "0");
        }
        form = form.text("deciderRules[]", "");

        let page = self.post_file("/repo/?mod=upload_file", form).await?;
        parser::parse_new_upload_number(&page.body)
            .filter(|id| *id >= 1)
            .ok_or_else(|| {
                JobError::NoUploadId {
                    path: file_path.display().to_string(),
                }
                .into()
            })
    }

    /// Licenses known to the server, read through an upload's license view
    pub async fn licenses(
        &mut self,
        upload_id: u64,
        item_id: u64,
    ) -> Result<Vec<ParsedLicense>, FossDriverError> {
        let endpoint = format!("/repo/?mod=view-license&upload={}&item={}", upload_id, item_id);
        let page = self.get(&endpoint).await?;
        Ok(parser::parse_all_license_data(&page.body))
    }

    /// Summary counters of the license browser for an upload
    pub async fn upload_statistics(
        &mut self,
        upload_id: u64,
        item_id: u64,
    ) -> Result<LicenseSummary, FossDriverError> {
        let endpoint = format!("/repo/?mod=license&upload={}&item={}", upload_id, item_id);
        let page = self.get(&endpoint).await?;
        Ok(parser::parse_license_summary(&page.body)?)
    }

    /// Jobs of an upload (first page only)
    pub async fn jobs_for_upload(&mut self, upload_id: u64) -> Result<Vec<ParsedJob>, FossDriverError> {
        let fields = vec![
            ("upload".to_string(), upload_id.to_string()),
            ("allusers".to_string(), "0".to_string()),
            ("page".to_string(), "0".to_string()),
        ];
        let page = self.post("/repo/?mod=ajaxShowJobs&do=showjb", fields).await?;
        if self.is_at_least_version(JSON_JOBS_VERSION) {
            Ok(parser::parse_json_show_jobs(&page.body)?)
        } else {
            let decoded = parser::decode_ajax_show_jobs(&page.body)?;
            Ok(parser::parse_decoded_show_jobs(&decoded))
        }
    }

    /// Id of the newest job run by `agent` on the upload
    pub async fn most_recent_agent_job(
        &mut self,
        upload_id: u64,
        agent: &str,
    ) -> Result<Option<u64>, FossDriverError> {
        let jobs = self.jobs_for_upload(upload_id).await?;
        Ok(jobs
            .iter()
            .filter(|job| job.agent == agent)
            .map(|job| job.id)
            .max())
    }

    /// Details of one job
    pub async fn job(&mut self, job_id: u64) -> Result<ParsedJob, FossDriverError> {
        let endpoint = format!("/repo/?mod=ajaxShowJobs&do=showSingleJob&jobId={}", job_id);
        let page = self.get(&endpoint).await?;
        Ok(parser::parse_single_job(&page.body)?)
    }

    /// Whether the newest `agent` job of the upload has reached a terminal state
    pub async fn is_agent_done(&mut self, upload_id: u64, agent: &str) -> Result<bool, FossDriverError> {
        let job_id = self.require_agent_job(upload_id, agent).await?;
        let job = self.job(job_id).await?;
        Ok(job.is_completed() || job.is_failed())
    }

    async fn require_agent_job(&mut self, upload_id: u64, agent: &str) -> Result<u64, FossDriverError> {
        self.most_recent_agent_job(upload_id, agent)
            .await?
            .ok_or_else(|| {
                JobError::NotFound {
                    agent: agent.to_string(),
                    upload_id,
                }
                .into()
            })
    }

    /// Poll until the newest `agent` job of the upload completes
    ///
    /// A job whose status reports it was killed or failed ends the wait
    /// with [`JobError::Failed`].
    pub async fn wait_until_agent_is_done(
        &mut self,
        upload_id: u64,
        agent: &str,
        poll: PollOptions,
    ) -> Result<ParsedJob, FossDriverError> {
        let job_id = self.require_agent_job(upload_id, agent).await?;
        let started = tokio::time::Instant::now();

        loop {
            let job = self.job(job_id).await?;
            if job.is_completed() {
                debug!("Job {} ({}) completed", job_id, agent);
                return Ok(job);
            }
            if job.is_failed() {
                return Err(JobError::Failed {
                    job_id,
                    agent: agent.to_string(),
                    status: job.status,
                }
                .into());
            }
            if let Some(limit) = poll.timeout {
                if started.elapsed() >= limit {
                    return Err(JobError::Timeout {
                        job_id,
                        agent: agent.to_string(),
                        seconds: limit.as_secs(),
                    }
                    .into());
                }
            }
            debug!("Job {} ({}) status '{}', waiting", job_id, agent, job.status);
            tokio::time::sleep(poll.interval).await;
        }
    }

    async fn add_agents(&mut self, upload_id: u64, agents: &[&str], extra: &[(&str, String)]) -> Result<(), FossDriverError> {
        let mut fields: Vec<(String, String)> = agents
            .iter()
            .map(|agent| ("agents[]".to_string(), format!("agent_{}", agent)))
            .collect();
        fields.push(("upload".to_string(), upload_id.to_string()));
        fields.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));
        self.post("/repo/?mod=agent_add", fields).await?;
        Ok(())
    }

    /// Start the monk and nomos license scanners
    pub async fn start_monk_and_nomos(&mut self, upload_id: u64) -> Result<(), FossDriverError> {
        self.add_agents(upload_id, &["monk", "nomos"], &[]).await
    }

    /// Start the copyright scanner
    pub async fn start_copyright(&mut self, upload_id: u64) -> Result<(), FossDriverError> {
        self.add_agents(upload_id, &["copyright"], &[]).await
    }

    /// Start the reuser, copying decisions from `reused_upload_id`
    pub async fn start_reuser(
        &mut self,
        upload_id: u64,
        reused_upload_id: u64,
    ) -> Result<(), FossDriverError> {
        // the server expects "<upload>, <group>"; group 3 is the default user group
        let reuse = format!("{}, 3", reused_upload_id);
        self.add_agents(upload_id, &["reuser"], &[("uploadToReuse", reuse)])
            .await
    }

    /// Start an SPDX report generator
    pub async fn start_spdx_report(
        &mut self,
        upload_id: u64,
        format: SpdxFormat,
    ) -> Result<(), FossDriverError> {
        let endpoint = format!(
            "/repo/?mod=ui_spdx2&outputFormat={}&upload={}",
            format.agent(),
            upload_id
        );
        self.get(&endpoint).await?;
        Ok(())
    }

    /// Download the newest completed SPDX report of the upload to `out_path`
    pub async fn download_spdx_report(
        &mut self,
        upload_id: u64,
        format: SpdxFormat,
        out_path: &Path,
    ) -> Result<(), FossDriverError> {
        let agent = format.agent();
        let job_id = self.require_agent_job(upload_id, agent).await?;
        let job = self.job(job_id).await?;
        let report_id = match job.report_id {
            Some(id) if job.agent == agent && job.is_completed() => id,
            _ => {
                return Err(JobError::ReportUnavailable {
                    agent: agent.to_string(),
                    upload_id,
                }
                .into())
            }
        };

        let page = self
            .get(&format!("/repo/?mod=download&report={}", report_id))
            .await?;
        tokio::fs::write(out_path, page.body.as_bytes())
            .await
            .map_err(|e| FossDriverError::io(out_path.display().to_string(), e))?;
        info!("Wrote {} report to {}", agent, out_path.display());
        Ok(())
    }

    /// Start a monkbulk run matching `ref_text` below `item_id`
    ///
    /// Actions are submitted as `bulkAction[i]` rows in slice order.
    pub async fn start_bulk_text_match(
        &mut self,
        ref_text: &str,
        item_id: u64,
        actions: &[BulkAction],
    ) -> Result<(), FossDriverError> {
        let mut fields = vec![
            ("refText".to_string(), ref_text.to_string()),
            ("bulkScope".to_string(), "u".to_string()),
            ("uploadTreeId".to_string(), item_id.to_string()),
            ("forceDecision".to_string(), "0".to_string()),
        ];
        for (row, action) in actions.iter().enumerate() {
            let prefix = format!("bulkAction[{}]", row);
            fields.push((format!("{}[licenseId]", prefix), action.license_id.to_string()));
            fields.push((format!("{}[licenseName]", prefix), action.license_name.clone()));
            fields.push((format!("{}[action]", prefix), action.action.clone()));
        }
        self.post("/repo/?mod=change-license-bulk", fields).await?;
        Ok(())
    }

    /// Upload an SPDX RDF file and start the report import agent on an upload
    ///
    /// Licenses are imported as new licenses and concluded findings become
    /// (overwriting) decisions; copyright findings are not imported.
    pub async fn start_rdf_import(
        &mut self,
        rdf_path: &Path,
        folder_id: u64,
        upload_id: u64,
    ) -> Result<(), FossDriverError> {
        let form = MultipartForm::new()
            .text("oldfolderid", folder_id.to_string())
            .text("uploadselect", upload_id.to_string())
            .file("report", rdf_path)?
            .text("addNewLicensesAs", "license")
            .text("addConcludedAsDecisions", "true")
            .text("addConcludedAsDecisionsOverwrite", "true");
        self.post_file("/repo/?mod=ui_reportImport", form).await?;
        Ok(())
    }
}

fn check_status(request: &Request, page: &Page) -> Result<(), SessionError> {
    if page.is_success() {
        Ok(())
    } else {
        Err(SessionError::Status {
            url: request.url().to_string(),
            status: page.status,
        })
    }
}

//! Error types for fossdriver
//!
//! This module defines custom error types using `thiserror`. Each failure
//! family (configuration, session, resolution, job, parsing) has its own enum
//! so the CLI can map it to a distinct exit code.

use thiserror::Error;

/// Main error type for fossdriver
#[derive(Error, Debug)]
pub enum FossDriverError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Login, transport and session maintenance errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// A named object could not be found on the server
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// A server-side job failed or could not be tracked
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// The server returned a page we could not understand
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Local file access failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path of the local file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

impl FossDriverError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        FossDriverError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that occur while loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        /// Path to the configuration file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The JSON configuration could not be parsed
    #[error("Failed to parse JSON config '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    /// The TOML configuration could not be parsed
    #[error("Failed to parse TOML config '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    /// One or more required fields are empty or absent
    #[error("Missing required field(s) in config: {}", fields.join(", "))]
    MissingFields {
        /// Names of the missing fields, as spelled in the file
        fields: Vec<String>,
    },

    /// The server URL is not an http(s) URL
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    /// No home directory to resolve the default config path against
    #[error("Could not determine the home directory for the default config path")]
    NoHomeDirectory,
}

/// Errors raised by the session client
#[derive(Error, Debug)]
pub enum SessionError {
    /// The server rejected the configured credentials
    #[error("Login failed for user '{username}': user name and password not recognised")]
    AuthenticationFailed { username: String },

    /// The server kept reporting a timed-out session after re-login
    #[error("Unable to re-login: more than {attempts} consecutive login attempts")]
    TooManyLoginAttempts { attempts: u32 },

    /// The HTTP request itself failed
    #[error("HTTP request to '{url}' failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP request to '{url}' returned status {status}")]
    Status { url: String, status: u16 },

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    /// A file attached to a form could not be opened for streaming
    #[error("Failed to open '{path}' for upload: {source}")]
    Attachment {
        path: String,
        source: std::io::Error,
    },
}

/// A name given by the caller that has no server-side counterpart
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Folder '{name}' not found on server")]
    FolderNotFound { name: String },

    #[error("Upload '{name}' not found in folder '{folder}'")]
    UploadNotFound { name: String, folder: String },

    #[error("License '{name}' not found on server")]
    LicenseNotFound { name: String },

    #[error("Server returned no licenses for upload '{upload}'")]
    NoLicenses { upload: String },
}

/// Errors about server-side agent jobs
#[derive(Error, Debug)]
pub enum JobError {
    /// No job of the agent exists for the upload
    #[error("No '{agent}' job found for upload {upload_id}")]
    NotFound { agent: String, upload_id: u64 },

    /// The agent ended in a failure state
    #[error("Job {job_id} ({agent}) failed with status '{status}'")]
    Failed {
        job_id: u64,
        agent: String,
        status: String,
    },

    /// The job did not finish before the configured deadline
    #[error("Job {job_id} ({agent}) did not finish within {seconds}s")]
    Timeout {
        job_id: u64,
        agent: String,
        seconds: u64,
    },

    /// The upload form did not return a usable upload id
    #[error("Upload of '{path}' did not return an upload id")]
    NoUploadId { path: String },

    /// A report was requested before its generator completed
    #[error("No completed '{agent}' report available for upload {upload_id}")]
    ReportUnavailable { agent: String, upload_id: u64 },

    /// A folder was submitted for creation but cannot be found afterwards
    #[error("Folder '{name}' was not created")]
    FolderNotCreated { name: String },
}

/// Unexpected content in a server response
#[derive(Error, Debug)]
pub enum ParseError {
    /// An element the page should contain is missing
    #[error("Expected {what} in {page} response")]
    Missing { what: String, page: String },

    /// A value was present but malformed
    #[error("Invalid {what} '{value}' in {page} response")]
    Invalid {
        what: String,
        value: String,
        page: String,
    },

    /// The response was not the JSON we expected
    #[error("Invalid JSON in {page} response: {source}")]
    Json {
        page: String,
        source: serde_json::Error,
    },
}

impl ParseError {
    pub(crate) fn missing(what: impl Into<String>, page: impl Into<String>) -> Self {
        ParseError::Missing {
            what: what.into(),
            page: page.into(),
        }
    }

    pub(crate) fn invalid(
        what: impl Into<String>,
        value: impl Into<String>,
        page: impl Into<String>,
    ) -> Self {
        ParseError::Invalid {
            what: what.into(),
            value: value.into(),
            page: page.into(),
        }
    }
}

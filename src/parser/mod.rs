//! # Parser Module
//!
//! Turns FOSSology response bodies into typed records. Every function here
//! is pure: it receives a page body and returns data or a [`ParseError`].
//!
//! The markup and JSON shapes follow one FOSSology release line (3.x). Newer
//! or older servers may change them without notice, and these parsers will
//! then report a `ParseError` rather than guess.
//!
//! [`ParseError`]: crate::error::ParseError

pub mod html;
pub mod jobs;
pub mod pages;
pub mod version;

pub use jobs::{
    decode_ajax_show_jobs, parse_decoded_show_jobs, parse_json_show_jobs, parse_single_job,
};
pub use pages::{
    parse_all_license_data, parse_folder_list, parse_folder_number, parse_license_summary, parse_new_upload_number,
    parse_upload_form_build_token, parse_upload_list, parse_version_number,
};
pub use version::ServerVersion;

use serde::Serialize;

/// Status text FOSSology shows for a successfully finished job
pub const STATUS_COMPLETED: &str = "Completed";

/// Status we assign to a queued job with no end text yet
pub const STATUS_NOT_STARTED: &str = "Not started";

/// A folder offered in the upload form's folder selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFolder {
    pub id: u64,
    pub name: String,
}

/// One upload as listed in a folder browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUpload {
    pub name: String,
    pub id: u64,
    /// Upload tree item of the upload root, needed by license views
    pub top_tree_item_id: Option<u64>,
    pub spdx_tv_url: Option<String>,
    pub spdx_xml_url: Option<String>,
}

/// A license known to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLicense {
    pub name: String,
    pub id: u64,
}

/// One agent job of an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJob {
    pub id: u64,
    pub status: String,
    pub agent: String,
    /// Report id, only set for completed report generators
    pub report_id: Option<u64>,
}

impl ParsedJob {
    /// Whether the job finished successfully
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Whether the job ended without producing a result
    pub fn is_failed(&self) -> bool {
        let status = self.status.to_ascii_lowercase();
        status.contains("killed") || status.contains("failed")
    }
}

/// Counters from the summary table of the license browser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseSummary {
    pub unique_licenses: u64,
    pub files: u64,
    pub unique_scanner_detected_licenses: u64,
    pub unique_concluded_licenses: u64,
    pub licenses_found: u64,
    pub licenses_concluded: u64,
    pub files_with_no_detected_licenses: u64,
    pub concluded_files_with_no_detected_licenses: u64,
}

impl LicenseSummary {
    /// Label/value pairs in the order the server shows them
    pub fn entries(&self) -> [(&'static str, u64); 8] {
        [
            ("Unique licenses", self.unique_licenses),
            ("Files", self.files),
            (
                "Unique scanner detected licenses",
                self.unique_scanner_detected_licenses,
            ),
            ("Unique concluded licenses", self.unique_concluded_licenses),
            ("Licenses found", self.licenses_found),
            ("Licenses concluded", self.licenses_concluded),
            (
                "Files with no detected licenses",
                self.files_with_no_detected_licenses,
            ),
            (
                "Concluded files with no detected licenses",
                self.concluded_files_with_no_detected_licenses,
            ),
        ]
    }
}

//! Exit codes for the CLI
//!
//! Each failure family maps to its own code so scripts driving fossdriver
//! can tell a rejected login from a failed scan.
//!
//! # Exit Code Reference
//!
//! | Code | Constant | Meaning | Example |
//! |------|----------|---------|---------|
//! | 0 | `SUCCESS` | Success | Task finished, report written |
//! | 1 | `JOB_FAILED` | Server job failed | Agent killed, job timeout, no upload id |
//! | 2 | `INVALID_ARGS` | Invalid arguments | Bad `--action`, unknown option (clap) |
//! | 3 | `CONFIG_ERROR` | Configuration error | Missing config file, empty password |
//! | 4 | `SESSION_ERROR` | Session error | Bad credentials, server unreachable |
//! | 5 | `NOT_FOUND` | Name not found | Unknown folder, upload or license |
//! | 6 | `UNEXPECTED_RESPONSE` | Unparseable page | Server markup changed |
//! | 7 | `IO_ERROR` | Local file error | Archive unreadable, report not writable |
//!
//! # Usage
//!
//! ```rust,ignore
//! use fossdriver::cli::exit_codes;
//!
//! std::process::exit(exit_codes::for_error(&err));
//! ```

use crate::error::FossDriverError;

/// Success - the task or inspection completed.
pub const SUCCESS: i32 = 0;

/// A server-side job failed, timed out or returned nothing usable.
pub const JOB_FAILED: i32 = 1;

/// Invalid command-line arguments; matches the code clap exits with.
pub const INVALID_ARGS: i32 = 2;

/// Configuration file missing, unreadable or incomplete.
pub const CONFIG_ERROR: i32 = 3;

/// Login rejected, transport failure or unexpected HTTP status.
pub const SESSION_ERROR: i32 = 4;

/// A folder, upload or license name has no match on the server.
pub const NOT_FOUND: i32 = 5;

/// The server answered with a page we could not parse.
pub const UNEXPECTED_RESPONSE: i32 = 6;

/// Reading or writing a local file failed.
pub const IO_ERROR: i32 = 7;

/// Exit code for an error
pub fn for_error(error: &FossDriverError) -> i32 {
    match error {
        FossDriverError::Job(_) => JOB_FAILED,
        FossDriverError::Config(_) => CONFIG_ERROR,
        FossDriverError::Session(_) => SESSION_ERROR,
        FossDriverError::Resolve(_) => NOT_FOUND,
        FossDriverError::Parse(_) => UNEXPECTED_RESPONSE,
        FossDriverError::Io { .. } => IO_ERROR,
    }
}

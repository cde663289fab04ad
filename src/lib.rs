//! fossdriver library
//!
//! Drives a FOSSology server through its web interface: log in, upload
//! archives, run license and copyright scanners, apply bulk license
//! decisions and export SPDX reports, waiting on each server-side job
//! until it finishes.
//!
//! - [`config`] - Server URL and credentials
//! - [`server`] - Authenticated session and server operations
//! - [`tasks`] - Workflows built on the session
//! - [`parser`] - Parsers for the server's HTML and JSON pages

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod server;
pub mod tasks;
pub mod utils;

pub use error::FossDriverError;

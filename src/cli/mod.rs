//! # CLI Module
//!
//! This module defines the command-line interface for fossdriver using `clap`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `version` | Show the server version |
//! | `find` | Look up a folder and the uploads it contains |
//! | `stats` | Show the license summary of an upload |
//! | `create-folder` | Create a folder below an existing one |
//! | `upload` | Upload an archive and wait for it to unpack |
//! | `scanners` | Run the monk and nomos license scanners |
//! | `copyright` | Run the copyright agent |
//! | `reuse` | Reuse clearing decisions from an earlier upload |
//! | `bulk-match` | Run a bulk text match with license actions |
//! | `spdx-tv` | Export an SPDX tag-value report |
//! | `spdx-rdf` | Export an SPDX RDF report |
//! | `import-rdf` | Import an SPDX RDF document as decisions |
//!
//! ## Global Options
//!
//! - `-v, --verbose` - Increase verbosity level (use multiple times: -v, -vv, -vvv)
//! - `-c, --config <FILE>` - Path to the configuration file
//!
//! ## Examples
//!
//! ```bash
//! fossdriver upload burrow-1.0.tar.gz --folder Burrow
//! fossdriver scanners burrow-1.0.tar.gz --folder Burrow
//! fossdriver bulk-match burrow-1.0.tar.gz --folder Burrow \
//!     --text "Licensed under the MIT license" --action add=MIT
//! fossdriver spdx-tv burrow-1.0.tar.gz --folder Burrow -o burrow.spdx
//! ```

pub mod commands;
pub mod exit_codes;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{
    BulkMatchArgs, CreateFolderArgs, FindArgs, ImportRdfArgs, ReuseArgs, SpdxArgs, StatsArgs,
    UploadArgs, UploadRefArgs,
};

/// fossdriver - Drive FOSSology license scans from the command line
#[derive(Parser, Debug)]
#[command(name = "fossdriver")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file (defaults to ~/.fossdriver/fossdriverrc.json)
    #[arg(short, long, global = true, value_name = "FILE", env = "FOSSDRIVER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the version of the FOSSology server
    Version,

    /// Look up a folder and the uploads it contains
    Find(FindArgs),

    /// Show the license summary of an upload
    Stats(StatsArgs),

    /// Create a folder below an existing folder
    CreateFolder(CreateFolderArgs),

    /// Upload an archive and wait until it is unpacked
    Upload(UploadArgs),

    /// Run the monk and nomos license scanners on an upload
    Scanners(UploadRefArgs),

    /// Run the copyright agent on an upload
    Copyright(UploadRefArgs),

    /// Reuse clearing decisions from an earlier upload
    Reuse(ReuseArgs),

    /// Run a bulk text match and apply license actions to the hits
    BulkMatch(BulkMatchArgs),

    /// Export an SPDX tag-value report
    SpdxTv(SpdxArgs),

    /// Export an SPDX RDF report
    SpdxRdf(SpdxArgs),

    /// Import an SPDX RDF document as license decisions
    ImportRdf(ImportRdfArgs),
}

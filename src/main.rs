//! fossdriver - Drive FOSSology license scans from the command line
//!
//! This is the main entry point for the CLI application.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fossdriver::cli::commands::{self, find, stats, task, version};
use fossdriver::cli::{exit_codes, Cli, Commands};
use fossdriver::tasks::Task;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Version => version::execute(config).await,
        Commands::Find(args) => find::execute(args, config).await,
        Commands::Stats(args) => stats::execute(args, config).await,
        Commands::CreateFolder(args) => task::execute(Task::from(args), config).await,
        Commands::Upload(args) => task::execute(Task::from(args), config).await,
        Commands::Scanners(args) => task::execute(commands::scanners_task(args), config).await,
        Commands::Copyright(args) => task::execute(commands::copyright_task(args), config).await,
        Commands::Reuse(args) => task::execute(Task::from(args), config).await,
        Commands::BulkMatch(args) => task::execute(Task::from(args), config).await,
        Commands::SpdxTv(args) => {
            task::execute(Task::SpdxTv(commands::spdx_export(args)), config).await
        }
        Commands::SpdxRdf(args) => {
            task::execute(Task::SpdxRdf(commands::spdx_export(args)), config).await
        }
        Commands::ImportRdf(args) => task::execute(Task::from(args), config).await,
    };

    // Each error family has its own exit code
    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_codes::for_error(&e));
        }
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

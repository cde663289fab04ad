//! Task commands - Run one workflow and wait for its server-side job

use colored::Colorize;
use std::path::Path;

use super::{connect, spinner};
use crate::cli::exit_codes;
use crate::error::FossDriverError;
use crate::tasks::{Task, TaskOutcome};
use crate::utils::Timer;

pub async fn execute(task: Task, config_path: Option<&Path>) -> Result<i32, FossDriverError> {
    let mut server = connect(config_path).await?;

    let timer = Timer::start();
    let progress = spinner(format!("{}...", task));
    let result = task.run(&mut server).await;
    progress.finish_and_clear();

    let outcome = result?;
    let detail = match &outcome {
        TaskOutcome::Completed => String::new(),
        TaskOutcome::Uploaded { upload_id } => format!(", upload id {}", upload_id.to_string().cyan()),
        TaskOutcome::ReportWritten { path } => {
            format!(", report written to {}", path.display().to_string().cyan())
        }
    };
    eprintln!(
        "{} {} finished in {}{}",
        "Success:".green().bold(),
        task.name(),
        timer.elapsed_formatted(),
        detail
    );

    Ok(exit_codes::SUCCESS)
}

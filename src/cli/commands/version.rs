//! Version command - Show the version of the FOSSology server

use std::path::Path;

use super::connect;
use crate::cli::exit_codes;
use crate::error::FossDriverError;

pub async fn execute(config_path: Option<&Path>) -> Result<i32, FossDriverError> {
    let server = connect(config_path).await?;
    println!("{}", server.server_version());
    Ok(exit_codes::SUCCESS)
}

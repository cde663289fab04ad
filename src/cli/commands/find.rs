//! Find command - Look up a folder and its uploads

use std::path::Path;

use super::{connect, FindArgs};
use crate::cli::exit_codes;
use crate::cli::output::render_uploads;
use crate::error::FossDriverError;
use crate::parser::ParsedUpload;

pub async fn execute(args: FindArgs, config_path: Option<&Path>) -> Result<i32, FossDriverError> {
    let mut server = connect(config_path).await?;
    let folder_id = server.folder_id(&args.folder).await?;

    let uploads: Vec<ParsedUpload> = match &args.upload {
        Some(name) => server
            .find_upload(folder_id, name, !args.contains)
            .await?
            .into_iter()
            .collect(),
        None => server.uploads_in_folder(folder_id).await?,
    };

    print!(
        "{}",
        render_uploads(args.format, &args.folder, folder_id, &uploads)?
    );

    if args.upload.is_some() && uploads.is_empty() {
        return Ok(exit_codes::NOT_FOUND);
    }
    Ok(exit_codes::SUCCESS)
}

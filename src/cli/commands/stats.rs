//! Stats command - Show the license summary of an upload

use std::path::Path;

use super::{connect, StatsArgs};
use crate::cli::exit_codes;
use crate::cli::output::render_summary;
use crate::error::{FossDriverError, ParseError};

pub async fn execute(args: StatsArgs, config_path: Option<&Path>) -> Result<i32, FossDriverError> {
    let mut server = connect(config_path).await?;
    let upload = server
        .resolve_upload(&args.target.folder, &args.target.upload, true)
        .await?;
    let item_id = upload
        .top_tree_item_id
        .ok_or_else(|| ParseError::missing("upload tree item id", "browse-processPost"))?;

    let summary = server.upload_statistics(upload.id, item_id).await?;
    print!("{}", render_summary(args.format, &upload, &summary)?);
    Ok(exit_codes::SUCCESS)
}

//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::index_path;
use crate::youtube::extract_video_id;
use anyhow::Result;

/// Run the status command.
pub fn run_status(video: &str, settings: Settings) -> Result<()> {
    let video_id = extract_video_id(video)?;
    let path = index_path(&settings.vector_store_dir(), &video_id);

    Output::video_status(&video_id, path.exists());
    if path.exists() {
        Output::kv("Index", &path.display().to_string());
    } else {
        Output::info(&format!("Run 'tubechat process {}' to index it.", video_id));
    }

    Ok(())
}

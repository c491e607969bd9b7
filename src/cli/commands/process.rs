//! Process command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::ensure_api_key;
use crate::service::RagService;
use crate::vector_store::index_path;
use anyhow::Result;

/// Run the process command.
pub async fn run_process(input: &str, settings: Settings) -> Result<()> {
    if let Err(e) = ensure_api_key(&settings.openai) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let service = RagService::new(settings)?;
    let spinner = Output::spinner("Fetching and indexing transcript...");

    match service.process_video(None, Some(input)).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::success(&result.message);
            Output::kv("Video ID", &result.video_id);
            let path = index_path(service.storage_dir(), &result.video_id);
            Output::kv("Index", &path.display().to_string());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.to_string());
            return Err(e.into());
        }
    }

    Ok(())
}

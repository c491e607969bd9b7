//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::ensure_api_key;
use crate::service::RagService;
use crate::youtube::extract_video_id;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video: &str, question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = ensure_api_key(&settings.openai) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let video_id = extract_video_id(video)?;
    let service = RagService::new(settings)?;

    if !service.video_status(&video_id).exists {
        let spinner = Output::spinner("Processing video...");
        let processed = service.process_video(Some(&video_id), None).await;
        spinner.finish_and_clear();
        if let Err(e) = processed {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    }

    let spinner = Output::spinner("Thinking...");

    match service.chat(&video_id, question).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            println!("\n{}\n", answer.answer.trim());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.to_string());
            return Err(e.into());
        }
    }

    Ok(())
}

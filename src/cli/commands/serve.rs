//! Serve command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::ensure_api_key;
use crate::server::{self, AppState};
use crate::service::RagService;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let cors_origins = settings.server.cors_origins.clone();

    if let Err(e) = ensure_api_key(&settings.openai) {
        Output::warning(&e.to_string());
        Output::warning("Processing and chat requests will fail until it is set.");
    }

    let service = RagService::new(settings)?;
    let storage_dir = service.storage_dir().display().to_string();
    let app = server::router(Arc::new(AppState { service }), &cors_origins)?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Tubechat API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Index directory", &storage_dir);
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Process video", "POST /api/v1/video/process");
    Output::kv("Video status", "GET  /api/v1/video/{video_id}/status");
    Output::kv("Chat", "POST /api/v1/chat");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

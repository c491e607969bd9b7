//! HTTP API.
//!
//! Routes under `/api/v1` forward JSON payloads to [`RagService`].

use crate::error::{Result, TubechatError};
use crate::service::{ChatAnswer, ProcessResult, RagService, VideoStatus};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
pub struct AppState {
    pub service: RagService,
}

/// Build the API router.
pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Result<Router> {
    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/video/process", post(process_video))
        .route("/api/v1/video/{video_id}/status", get(video_status))
        .route("/api/v1/chat", post(chat))
        .layer(cors_layer(cors_origins)?)
        .with_state(state))
}

/// CORS for the configured browser origins.
///
/// Credentials are allowed unless the list contains `*`.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        url::Url::parse(origin)
            .map_err(|e| TubechatError::Config(format!("Invalid CORS origin {:?}: {}", origin, e)))?;
        let value = HeaderValue::from_str(origin.trim_end_matches('/'))
            .map_err(|e| TubechatError::Config(format!("Invalid CORS origin {:?}: {}", origin, e)))?;
        allowed.push(value);
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request()))
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    youtube_url: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    video_id: String,
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// An error rendered as `{"detail": ...}` with a 400 or 500 status.
pub enum ApiError {
    Service(TubechatError),
    BadRequest(String),
}

impl From<TubechatError> for ApiError {
    fn from(e: TubechatError) -> Self {
        ApiError::Service(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(e) if e.is_client_error() => {
                warn!("Rejected request: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Service(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal server error: {}", e),
                )
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "YouTube Transcript Chatbot API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn process_video(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ProcessRequest>, JsonRejection>,
) -> std::result::Result<Json<ProcessResult>, ApiError> {
    let Json(req) = payload?;

    let result = state
        .service
        .process_video(req.video_id.as_deref(), req.youtube_url.as_deref())
        .await?;

    Ok(Json(result))
}

async fn video_status(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Json<VideoStatus> {
    Json(state.service.video_status(&video_id))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<ChatAnswer>, ApiError> {
    let Json(req) = payload?;

    let answer = state.service.chat(&req.video_id, &req.question).await?;

    Ok(Json(answer))
}

//! Voice catalog and preview handlers.

use super::file_response;
use crate::api::AppState;
use crate::error::Result;
use crate::types::{VoiceInfo, VoicePreviewRequest};
use axum::{Json, extract::State, response::Response};

/// GET /tts/voices - Static voice catalog
#[utoipa::path(
    get,
    path = "/tts/voices",
    tag = "tts",
    responses(
        (status = 200, description = "Available voices", body = Vec<VoiceInfo>)
    )
)]
pub async fn list_voices(State(state): State<AppState>) -> Json<Vec<VoiceInfo>> {
    Json(state.orchestrator.voices())
}

/// POST /tts/preview - Synthesize (or reuse) a short sample for a voice
#[utoipa::path(
    post,
    path = "/tts/preview",
    tag = "tts",
    request_body = VoicePreviewRequest,
    responses(
        (status = 200, description = "MP3 audio", content_type = "audio/mpeg"),
        (status = 400, description = "Missing voice", body = crate::error::ApiError),
        (status = 501, description = "No speech engine available", body = crate::error::ApiError),
        (status = 503, description = "Speech engine failed", body = crate::error::ApiError)
    )
)]
pub async fn preview_voice(
    State(state): State<AppState>,
    Json(request): Json<VoicePreviewRequest>,
) -> Result<Response> {
    let path = state.orchestrator.preview_voice(&request).await?;
    file_response(&path, "audio/mpeg", None).await
}

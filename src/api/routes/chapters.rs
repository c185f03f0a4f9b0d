//! Chapter outline extraction handler.

use crate::api::AppState;
use crate::types::{ChapterOutline, ExtractChaptersRequest};
use axum::{Json, extract::State};

/// POST /extract-chapters - Heading outline of a page
///
/// Never fails: unreachable pages yield an empty outline titled with the URL.
#[utoipa::path(
    post,
    path = "/extract-chapters",
    tag = "chapters",
    request_body = ExtractChaptersRequest,
    responses(
        (status = 200, description = "Chapter outline (possibly empty)", body = ChapterOutline)
    )
)]
pub async fn extract_chapters(
    State(state): State<AppState>,
    Json(request): Json<ExtractChaptersRequest>,
) -> Json<ChapterOutline> {
    Json(state.orchestrator.extract_chapters(request.url.trim()).await)
}

//! Task handlers: submission, status, markdown, assets and downloads.

use super::{file_response, parse_task_id};
use crate::api::AppState;
use crate::error::Result;
use crate::storage::content_type_for;
use crate::types::{
    AssetKind, AssetListing, DownloadKind, MarkdownKind, MarkdownResponse, ProcessRequest,
    ProcessResponse, TaskStatusResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};

/// POST /process - Submit a URL for processing
#[utoipa::path(
    post,
    path = "/process",
    tag = "tasks",
    request_body = ProcessRequest,
    responses(
        (status = 200, description = "Task accepted", body = ProcessResponse),
        (status = 400, description = "URL is not an absolute http(s) URL", body = crate::error::ApiError),
        (status = 503, description = "Service is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>> {
    let response = state.orchestrator.submit(request).await?;
    Ok(Json(response))
}

/// GET /status/:task_id - Task status
#[utoipa::path(
    get,
    path = "/status/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Current task status", body = TaskStatusResponse),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>> {
    let id = parse_task_id(&task_id)?;
    Ok(Json(state.orchestrator.status(id).await?))
}

/// GET /task/:task_id/markdown/:kind - Source or article markdown
#[utoipa::path(
    get,
    path = "/task/{task_id}/markdown/{kind}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID"),
        ("kind" = String, Path, description = "`source` or `article`")
    ),
    responses(
        (status = 200, description = "Markdown document", body = MarkdownResponse),
        (status = 400, description = "Invalid markdown kind", body = crate::error::ApiError),
        (status = 404, description = "Task or file not found", body = crate::error::ApiError)
    )
)]
pub async fn get_markdown(
    State(state): State<AppState>,
    Path((task_id, kind)): Path<(String, String)>,
) -> Result<Json<MarkdownResponse>> {
    let kind: MarkdownKind = kind.parse()?;
    let id = parse_task_id(&task_id)?;
    Ok(Json(state.orchestrator.markdown(id, kind).await?))
}

/// GET /task/:task_id/assets - List images, screenshots and visuals used
#[utoipa::path(
    get,
    path = "/task/{task_id}/assets",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Asset listing", body = AssetListing),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_assets(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<AssetListing>> {
    let id = parse_task_id(&task_id)?;
    Ok(Json(state.orchestrator.assets(id).await?))
}

/// GET /task/:task_id/asset/:asset_type/:filename - Raw asset file
#[utoipa::path(
    get,
    path = "/task/{task_id}/asset/{asset_type}/{filename}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID"),
        ("asset_type" = String, Path, description = "`images` or `screenshots`"),
        ("filename" = String, Path, description = "File name (reduced to its base name)")
    ),
    responses(
        (status = 200, description = "Raw image bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid asset type or file name", body = crate::error::ApiError),
        (status = 404, description = "Task or file not found", body = crate::error::ApiError)
    )
)]
pub async fn get_asset_file(
    State(state): State<AppState>,
    Path((task_id, asset_type, filename)): Path<(String, String, String)>,
) -> Result<Response> {
    let kind: AssetKind = asset_type.parse()?;
    let id = parse_task_id(&task_id)?;
    let path = state.orchestrator.asset_path(id, kind, &filename).await?;
    file_response(&path, content_type_for(&path), None).await
}

/// GET /download/:download_type/:task_id - Finished article or video
#[utoipa::path(
    get,
    path = "/download/{download_type}/{task_id}",
    tag = "tasks",
    params(
        ("download_type" = String, Path, description = "`article` or `video`"),
        ("task_id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "File attachment (summary.md or video.mp4)", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid type, or task not completed", body = crate::error::ApiError),
        (status = 404, description = "Task or file not found", body = crate::error::ApiError)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Path((download_type, task_id)): Path<(String, String)>,
) -> Result<Response> {
    let kind: DownloadKind = download_type.parse()?;
    let id = parse_task_id(&task_id)?;
    let path = state.orchestrator.download_path(id, kind).await?;
    file_response(&path, kind.content_type(), Some(kind.download_name())).await
}

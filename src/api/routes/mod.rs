//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] — Task submission, status and artifacts
//! - [`chapters`] — Chapter outline extraction
//! - [`tts`] — Voice catalog and previews
//! - [`system`] — Health, capabilities, events, OpenAPI

use crate::error::{Error, Result};
use crate::types::TaskId;
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::Path;
use tokio_util::io::ReaderStream;

mod chapters;
mod system;
mod tasks;
mod tts;

// Re-export all handlers so `routes::function_name` works
pub use chapters::*;
pub use system::*;
pub use tasks::*;
pub use tts::*;

/// Parse a task id path segment; malformed ids are reported as unknown tasks
pub(crate) fn parse_task_id(raw: &str) -> Result<TaskId> {
    raw.parse()
        .map_err(|_| Error::NotFound(format!("Task {raw} not found")))
}

/// Stream a file as the response body
///
/// With `download_name`, a `Content-Disposition: attachment` header is added.
pub(crate) async fn file_response(
    path: &Path,
    content_type: &str,
    download_name: Option<&str>,
) -> Result<Response> {
    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::NotFound(format!("File {} not found", path.display()))
        }
        _ => Error::Io(e),
    })?;
    let length = file.metadata().await?.len();

    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(file))).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Some(name) = download_name
        && let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{name}\""))
    {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

//! Error types for autoread
//!
//! This module provides error handling for the whole service, including:
//! - Domain-specific error types (Task, Fetch, Compose)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//! - Context information (task id, url, file path, etc.)

use crate::types::{Status, TaskId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for autoread operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for autoread
///
/// This is the primary error type used throughout the crate. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "video.width")
        key: Option<String>,
    },

    /// Task lifecycle error
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// Content fetching error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Narration or video composition error
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),

    /// Malformed request (bad enum value, bad identifier, bad body)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource (artifact, asset) does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// External tool execution failed (chromium, edge-tts, ffmpeg, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, no adapter configured, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Task lifecycle errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task id unknown to the registry
    #[error("task {id} not found")]
    NotFound {
        /// The task id that was not found
        id: TaskId,
    },

    /// Task already reached a terminal state and cannot be mutated
    #[error("task {id} is already {status}")]
    AlreadyTerminal {
        /// The task id
        id: TaskId,
        /// The terminal status it reached
        status: Status,
    },

    /// Operation requires a completed task
    #[error("task {id} is not completed yet (currently {status})")]
    NotCompleted {
        /// The task id
        id: TaskId,
        /// The current status
        status: Status,
    },
}

/// Content fetching errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// The submitted URL is not an absolute http(s) URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The page responded with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// HTTP status code returned
        status: u16,
    },

    /// Both the rendering strategy and the plain HTTP strategy failed
    #[error("failed to fetch {url}: rendering failed ({primary}); plain fetch failed ({fallback})")]
    AllStrategiesFailed {
        /// The requested URL
        url: String,
        /// Error from the rendering strategy
        primary: String,
        /// Error from the plain HTTP strategy
        fallback: String,
    },
}

/// Narration and video composition errors
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Neither real speech nor the silent fallback track could be produced
    #[error("audio track unavailable: {reason}")]
    AudioUnavailable {
        /// The reason the audio track is missing
        reason: String,
    },

    /// The video encoder failed
    #[error("video encoding failed: {reason}")]
    EncodeFailed {
        /// The reason encoding failed
        reason: String,
    },

    /// Encoder reported success but produced no file
    #[error("encoder produced no output at {path}")]
    OutputMissing {
        /// The expected output path
        path: PathBuf,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task error: task 6f1c... not found",
///     "details": {
///       "task_id": "6f1c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_request")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,
            Error::Fetch(FetchError::InvalidUrl { .. }) => 400,
            Error::Task(TaskError::NotCompleted { .. }) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Task(TaskError::NotFound { .. }) => 404,

            // 409 Conflict - Task already terminal
            Error::Task(TaskError::AlreadyTerminal { .. }) => 409,

            // 500 Internal Server Error - Server-side issues
            Error::Compose(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Serialization(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - Upstream page or service errors
            Error::Fetch(FetchError::HttpStatus { .. }) => 502,
            Error::Fetch(FetchError::AllStrategiesFailed { .. }) => 502,
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::ExternalTool(_) => 503,

            // 501 Not Implemented - Feature not supported
            Error::NotSupported(_) => 501,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::AlreadyTerminal { .. } => "already_terminal",
                TaskError::NotCompleted { .. } => "task_not_completed",
            },
            Error::Fetch(e) => match e {
                FetchError::InvalidUrl { .. } => "invalid_url",
                FetchError::HttpStatus { .. } => "upstream_status",
                FetchError::AllStrategiesFailed { .. } => "fetch_failed",
            },
            Error::Compose(e) => match e {
                ComposeError::AudioUnavailable { .. } => "audio_unavailable",
                ComposeError::EncodeFailed { .. } => "encode_failed",
                ComposeError::OutputMissing { .. } => "output_missing",
            },
            Error::InvalidRequest(_) => "invalid_request",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Task(TaskError::NotFound { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::AlreadyTerminal { id, status })
            | Error::Task(TaskError::NotCompleted { id, status }) => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::Fetch(FetchError::InvalidUrl { url, .. }) => Some(serde_json::json!({
                "url": url,
            })),
            Error::Fetch(FetchError::HttpStatus { url, status }) => Some(serde_json::json!({
                "url": url,
                "upstream_status": status,
            })),
            Error::Compose(ComposeError::OutputMissing { path }) => Some(serde_json::json!({
                "path": path,
            })),
            _ => None,
        };

        let mut api_error = ApiError::new(code, message);
        api_error.error.details = details;
        api_error
    }
}

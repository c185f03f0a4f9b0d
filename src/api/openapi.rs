//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the autoread REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the autoread REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "autoread REST API",
        version = "0.1.0",
        description = "Turns a web page into a summary article and a narrated video. Submit a URL, poll its status, then fetch the markdown, images and MP4.",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::process,
        crate::api::routes::get_status,
        crate::api::routes::get_markdown,
        crate::api::routes::get_assets,
        crate::api::routes::get_asset_file,
        crate::api::routes::download,

        // Chapters
        crate::api::routes::extract_chapters,

        // Speech
        crate::api::routes::list_voices,
        crate::api::routes::preview_voice,

        // System
        crate::api::routes::get_capabilities,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::Status,
        crate::types::Stage,
        crate::types::Outcome,
        crate::types::LlmMeta,
        crate::types::TtsMeta,
        crate::types::LlmOverride,
        crate::types::ProcessRequest,
        crate::types::ProcessResponse,
        crate::types::TaskStatusResponse,
        crate::types::MarkdownKind,
        crate::types::AssetKind,
        crate::types::DownloadKind,
        crate::types::MarkdownResponse,
        crate::types::AssetLink,
        crate::types::AssetListing,
        crate::types::Chapter,
        crate::types::ChapterOutline,
        crate::types::ExtractChaptersRequest,
        crate::types::VoiceInfo,
        crate::types::VoicePreviewRequest,
        crate::types::Event,
        crate::types::AdapterInfo,
        crate::types::Capabilities,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Tasks - Submit URLs, poll progress, fetch markdown, assets and downloads"),
        (name = "chapters", description = "Chapters - Extract a heading outline from a page"),
        (name = "tts", description = "Speech - Voice catalog and voice previews"),
        (name = "system", description = "System endpoints - Health checks, capabilities, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;

//! # autoread
//!
//! Turns a web article into a narrated short video.
//!
//! A submitted URL runs through three stages in the background:
//! - **Fetch** - render the page in a headless browser (or fall back to a
//!   plain HTTP GET), extract the visible text and download its images
//! - **Summarize** - condense the text into a narration with an
//!   OpenAI-compatible chat backend (a placeholder narration when none is
//!   configured)
//! - **Compose** - synthesize speech and encode an MP4 slideshow over it
//!
//! Clients poll the REST API for status and fetch the markdown, images and
//! video once the task completes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use autoread::{Config, TaskOrchestrator, types::ProcessRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = TaskOrchestrator::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let accepted = orchestrator
//!         .submit(ProcessRequest {
//!             url: "https://example.com/article".into(),
//!             user_id: None,
//!             llm: None,
//!             chapters: None,
//!             voice: None,
//!             word_count: None,
//!         })
//!         .await?;
//!     println!("task {}", accepted.task_id);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Speech synthesis and video encoding
pub mod composer;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Task orchestration (decomposed into focused submodules)
pub mod pipeline;
/// External binary discovery and execution
pub mod process;
/// In-memory task records
pub mod registry;
/// Page fetching and content extraction
pub mod scraper;
/// On-disk artifact layout
pub mod storage;
/// LLM narration
pub mod summarizer;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use composer::{EncodePlan, SpeechSynthesizer, VideoEncoder};
pub use config::Config;
pub use error::{
    ApiError, ComposeError, Error, ErrorDetail, FetchError, Result, TaskError, ToHttpStatus,
};
pub use pipeline::{Adapters, TaskOrchestrator};
pub use registry::TaskRegistry;
pub use scraper::{PageRenderer, RenderedPage};
pub use types::{Event, Outcome, Stage, Status, TaskId};

/// Serve the REST API until a termination signal arrives.
///
/// On the signal, new submissions are refused, in-flight pipelines are
/// drained, and then the server stops.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use autoread::{Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run_with_shutdown(Config::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(config: Config) -> Result<()> {
    let orchestrator = std::sync::Arc::new(TaskOrchestrator::new(config).await?);
    let config = orchestrator.get_config();

    let draining = orchestrator.clone();
    api::start_api_server(orchestrator, config, async move {
        wait_for_signal().await;
        if let Err(e) = draining.shutdown().await {
            tracing::error!(error = %e, "Error during graceful shutdown");
        }
    })
    .await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

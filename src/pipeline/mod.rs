//! Task orchestration split into focused submodules.
//!
//! The `TaskOrchestrator` struct and its methods are organized by concern:
//! - [`submit`] - Task creation and background pipeline spawning
//! - [`stages`] - Fetch → summarize → compose, and the failure boundary
//! - [`query`] - Read-side operations (status, artifacts, chapters, voices)
//! - [`lifecycle`] - Graceful shutdown

mod lifecycle;
mod query;
mod stages;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::composer::{
    Composer, EdgeTtsSynthesizer, FfmpegEncoder, NoOpSpeechSynthesizer, NoOpVideoEncoder,
    SpeechSynthesizer, VideoEncoder,
};
use crate::config::Config;
use crate::error::Result;
use crate::process;
use crate::registry::TaskRegistry;
use crate::scraper::{ChromiumRenderer, ContentFetcher, NoOpRenderer, PageRenderer};
use crate::storage::StorageLayout;
use crate::summarizer::Summarizer;
use crate::types::{AdapterInfo, Capabilities, Event, TaskId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// External collaborators, selected once at construction
#[derive(Clone)]
pub struct Adapters {
    /// Primary fetch strategy
    pub renderer: Arc<dyn PageRenderer>,
    /// Text-to-speech engine
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Video encoder
    pub encoder: Arc<dyn VideoEncoder>,
}

impl Adapters {
    /// Pick implementations from configuration and the binaries on the host
    ///
    /// Each tool resolves to its explicitly configured path first, then a PATH
    /// search when `tools.search_path` is set, and a no-op implementation
    /// otherwise.
    pub fn discover(config: &Config) -> Self {
        let tools = &config.tools;

        let renderer: Arc<dyn PageRenderer> = match process::discover(
            tools.browser_path.as_ref(),
            ChromiumRenderer::CANDIDATES,
            tools.search_path,
        ) {
            Some(binary) => Arc::new(ChromiumRenderer::new(
                binary,
                config.scraper.render_timeout,
                config.video.width,
                config.video.height,
                config.scraper.user_agent.clone(),
            )),
            None => Arc::new(NoOpRenderer),
        };

        let speech: Arc<dyn SpeechSynthesizer> = match process::discover(
            tools.edge_tts_path.as_ref(),
            EdgeTtsSynthesizer::CANDIDATES,
            tools.search_path,
        ) {
            Some(binary) => Arc::new(EdgeTtsSynthesizer::new(
                binary,
                config.speech.synthesis_timeout,
            )),
            None => Arc::new(NoOpSpeechSynthesizer),
        };

        let ffprobe = process::discover(tools.ffprobe_path.as_ref(), &["ffprobe"], tools.search_path);
        let encoder: Arc<dyn VideoEncoder> =
            match process::discover(tools.ffmpeg_path.as_ref(), &["ffmpeg"], tools.search_path) {
                Some(binary) => Arc::new(FfmpegEncoder::new(
                    binary,
                    ffprobe,
                    config.video.encode_timeout,
                )),
                None => Arc::new(NoOpVideoEncoder),
            };

        tracing::info!(
            renderer = renderer.name(),
            speech = speech.name(),
            encoder = encoder.name(),
            "media adapters initialized"
        );

        Self {
            renderer,
            speech,
            encoder,
        }
    }
}

/// Stage collaborators
#[derive(Clone)]
pub(crate) struct MediaPipeline {
    /// URL → title, text, images, screenshots
    pub(crate) fetcher: Arc<ContentFetcher>,
    /// Text → narration
    pub(crate) summarizer: Arc<Summarizer>,
    /// Narration + visuals → video
    pub(crate) composer: Arc<Composer>,
}

/// Background pipeline bookkeeping
#[derive(Clone)]
pub(crate) struct RunState {
    /// Bounds the number of pipelines running at once
    pub(crate) concurrent_limit: Arc<tokio::sync::Semaphore>,
    /// Join handles of pipelines that have not finished yet
    pub(crate) handles: Arc<tokio::sync::Mutex<HashMap<TaskId, tokio::task::JoinHandle<()>>>>,
    /// Cleared on shutdown; submissions are refused afterwards
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct TaskOrchestrator {
    /// Task records, shared with the HTTP layer
    pub registry: Arc<TaskRegistry>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Artifact paths
    pub(crate) storage: StorageLayout,
    /// Stage collaborators
    pub(crate) media: MediaPipeline,
    /// Background pipeline bookkeeping
    pub(crate) run_state: RunState,
}

impl TaskOrchestrator {
    /// Create an orchestrator, discovering external tools on the host
    pub async fn new(config: Config) -> Result<Self> {
        let adapters = Adapters::discover(&config);
        Self::with_adapters(config, adapters).await
    }

    /// Create an orchestrator around explicit adapters
    ///
    /// Creates the storage directories, the HTTP clients and the event channel.
    pub async fn with_adapters(config: Config, adapters: Adapters) -> Result<Self> {
        config.validate()?;

        let storage = StorageLayout::new(config.storage.root.clone());
        storage.ensure_dirs().await?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.pipeline.event_buffer);

        let fetcher = ContentFetcher::new(
            config.scraper.clone(),
            storage.clone(),
            adapters.renderer,
        )?;
        let summarizer = Summarizer::new(config.llm.clone())?;
        let composer = Composer::new(
            adapters.speech,
            adapters.encoder,
            storage.clone(),
            config.speech.clone(),
            config.video.clone(),
        );

        let run_state = RunState {
            concurrent_limit: Arc::new(tokio::sync::Semaphore::new(
                config.pipeline.max_concurrent_tasks,
            )),
            handles: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        };

        tracing::info!(
            storage = %storage.root().display(),
            max_concurrent_tasks = config.pipeline.max_concurrent_tasks,
            "task orchestrator ready"
        );

        Ok(Self {
            registry: Arc::new(TaskRegistry::new()),
            event_tx,
            config: Arc::new(config),
            storage,
            media: MediaPipeline {
                fetcher: Arc::new(fetcher),
                summarizer: Arc::new(summarizer),
                composer: Arc::new(composer),
            },
            run_state,
        })
    }

    /// Subscribe to task events
    ///
    /// Each subscriber receives every event independently. A subscriber that
    /// falls behind by more than `pipeline.event_buffer` events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Storage layout used for artifacts
    pub fn storage(&self) -> &StorageLayout {
        &self.storage
    }

    /// Which collaborators are active
    pub fn capabilities(&self) -> Capabilities {
        let renderer = self.media.fetcher.renderer();
        let speech = self.media.composer.speech();
        let encoder = self.media.composer.encoder();

        Capabilities {
            renderer: AdapterInfo {
                name: renderer.name().to_string(),
                available: renderer.is_available(),
            },
            speech: AdapterInfo {
                name: speech.name().to_string(),
                available: speech.is_available(),
            },
            encoder: AdapterInfo {
                name: encoder.name().to_string(),
                available: encoder.is_available(),
            },
        }
    }

    /// Emit an event to all subscribers; dropped when nobody listens
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

//! Shared test helpers for creating TaskOrchestrator instances in tests.

use crate::composer::{EncodePlan, SpeechSynthesizer, VideoEncoder};
use crate::config::Config;
use crate::pipeline::{Adapters, TaskOrchestrator};
use crate::scraper::{PageRenderer, RenderedPage};
use crate::types::{Status, TaskId, TaskStatusResponse};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encode a solid-colour PNG of `width`×`height`
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([222, 165, 132]));
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Picture served for article images; clears the default area filter
pub(crate) fn article_png() -> Vec<u8> {
    png_bytes(160, 120)
}

/// Renderer that either serves fixed HTML (plus a screenshot) or fails
pub(crate) struct StubRenderer {
    pub(crate) html: Option<String>,
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn render(&self, url: &Url, screenshot_dir: Option<&Path>) -> crate::Result<RenderedPage> {
        let Some(html) = &self.html else {
            return Err(crate::Error::ExternalTool("no browser in tests".into()));
        };
        let mut screenshots = Vec::new();
        if let Some(dir) = screenshot_dir {
            tokio::fs::create_dir_all(dir).await?;
            let path = dir.join(crate::storage::screenshot_file_name(0));
            tokio::fs::write(&path, png_bytes(192, 108)).await?;
            screenshots.push(path);
        }
        Ok(RenderedPage {
            html: html.clone(),
            screenshots,
            final_url: Some(url.clone()),
        })
    }

    fn is_available(&self) -> bool {
        self.html.is_some()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Speech engine that writes a fake MP3 or fails
pub(crate) struct StubSpeech {
    pub(crate) fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(&self, _text: &str, _voice: &str, output: &Path) -> crate::Result<()> {
        if self.fail {
            return Err(crate::Error::ExternalTool("tts offline".into()));
        }
        tokio::fs::write(output, b"ID3stub").await?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.fail
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Encoder that records plans and writes a placeholder MP4
pub(crate) struct StubEncoder {
    pub(crate) speech_duration: f64,
    pub(crate) delay: Duration,
    pub(crate) fail: bool,
    pub(crate) panics: bool,
    pub(crate) plans: Mutex<Vec<EncodePlan>>,
}

impl Default for StubEncoder {
    fn default() -> Self {
        Self {
            speech_duration: 30.0,
            delay: Duration::ZERO,
            fail: false,
            panics: false,
            plans: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VideoEncoder for StubEncoder {
    async fn probe_duration(&self, _audio: &Path) -> crate::Result<f64> {
        Ok(self.speech_duration)
    }

    async fn encode(&self, plan: &EncodePlan) -> crate::Result<()> {
        self.plans.lock().unwrap().push(plan.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(crate::Error::ExternalTool("encoder crashed".into()));
        }
        if self.panics {
            panic!("encoder bug");
        }
        tokio::fs::create_dir_all(plan.output.parent().unwrap()).await?;
        tokio::fs::write(&plan.output, b"\0\0\0\x18ftypmp42").await?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Adapters where the browser fails (so pages come from plain HTTP) and
/// speech plus encoding succeed
pub(crate) fn stub_adapters() -> (Adapters, Arc<StubEncoder>) {
    adapters_with(None, false, StubEncoder::default())
}

/// Build adapters from stub settings; returns the encoder for plan inspection
pub(crate) fn adapters_with(
    rendered_html: Option<&str>,
    speech_fails: bool,
    encoder: StubEncoder,
) -> (Adapters, Arc<StubEncoder>) {
    let encoder = Arc::new(encoder);
    let adapters = Adapters {
        renderer: Arc::new(StubRenderer {
            html: rendered_html.map(str::to_string),
        }),
        speech: Arc::new(StubSpeech { fail: speech_fails }),
        encoder: encoder.clone(),
    };
    (adapters, encoder)
}

/// Helper to create a test orchestrator rooted in a temp directory.
/// Returns the orchestrator and the tempdir (which must be kept alive).
pub(crate) async fn create_test_orchestrator(adapters: Adapters) -> (TaskOrchestrator, tempfile::TempDir) {
    create_test_orchestrator_with(adapters, |_| {}).await
}

/// Like [`create_test_orchestrator`], with a config tweak applied first
pub(crate) async fn create_test_orchestrator_with<F>(
    adapters: Adapters,
    tweak: F,
) -> (TaskOrchestrator, tempfile::TempDir)
where
    F: FnOnce(&mut Config),
{
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.storage.root = temp_dir.path().join("storage");
    config.pipeline.max_concurrent_tasks = 2;
    // No API key: summarization takes the placeholder path unless a test overrides it
    config.llm.api_key = None;
    tweak(&mut config);

    let orchestrator = TaskOrchestrator::with_adapters(config, adapters)
        .await
        .unwrap();
    (orchestrator, temp_dir)
}

/// Poll until `id` reaches a terminal state, collecting every status read
pub(crate) async fn wait_for_terminal(
    orchestrator: &TaskOrchestrator,
    id: TaskId,
) -> Vec<TaskStatusResponse> {
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let status = orchestrator.status(id).await.unwrap();
        let terminal = status.status.is_terminal();
        seen.push(status);
        if terminal {
            return seen;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {id} did not finish; last status {:?}",
            seen.last().map(|s| s.status)
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Whether `status` ended as `completed`
pub(crate) fn completed(history: &[TaskStatusResponse]) -> bool {
    history.last().map(|s| s.status) == Some(Status::Completed)
}

/// Article page with two usable images and one too small to keep
pub(crate) const ARTICLE_HTML: &str = r#"<html>
<head><title>Test Article</title></head>
<body>
  <nav>Menu Home About</nav>
  <article>
    <h1>Big Heading</h1>
    <p>The first paragraph talks about Rust ownership.</p>
    <img src="/img/a.png">
    <img src="/img/tiny.png" width="40" height="40">
    <img src="/img/c.jpg">
  </article>
  <footer>Copyright footer</footer>
</body>
</html>"#;

/// Serve [`ARTICLE_HTML`] at `/article` and its images
pub(crate) async fn article_server() -> MockServer {
    let server = MockServer::start().await;
    serve_page(&server, "/article", ARTICLE_HTML).await;
    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(article_png(), "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/c.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(article_png(), "image/jpeg"))
        .mount(&server)
        .await;
    server
}

/// Mount an HTML page at `route`
pub(crate) async fn serve_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

//! Stub media adapters, page fixtures and orchestrator setup

use async_trait::async_trait;
use autoread::{
    Adapters, Config, EncodePlan, PageRenderer, RenderedPage, SpeechSynthesizer,
    TaskOrchestrator, VideoEncoder,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A 320×180 PNG, large enough to count as a visual
pub fn png_bytes() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(320, 180, image::Rgb([247, 76, 0]));
    let mut out = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

/// A news-style page with navigation noise and two images
pub const NEWS_HTML: &str = r#"<html>
<head><title>Ferris Learns to Fly</title></head>
<body>
  <header>Site header</header>
  <nav>Home | World | Tech</nav>
  <main>
    <h1>Ferris Learns to Fly</h1>
    <p>Ferris the crab surprised everyone by building a tiny glider.</p>
    <p>The glider was made entirely of recycled borrow checker errors.</p>
    <img src="/media/glider.png" alt="glider">
    <img src="/media/beach.png" alt="beach">
  </main>
  <footer>All rights reserved</footer>
</body>
</html>"#;

/// Browser that is never available, so pages come from plain HTTP
pub struct OfflineRenderer;

#[async_trait]
impl PageRenderer for OfflineRenderer {
    async fn render(&self, _url: &Url, _screenshot_dir: Option<&Path>) -> autoread::Result<RenderedPage> {
        Err(autoread::Error::NotSupported("no browser".into()))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

/// Speech engine writing a fake MP3, or failing when `fail` is set
pub struct FakeSpeech {
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, _text: &str, _voice: &str, output: &Path) -> autoread::Result<()> {
        if self.fail {
            return Err(autoread::Error::ExternalTool("speech service unreachable".into()));
        }
        tokio::fs::write(output, b"ID3fake").await?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.fail
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Encoder that records every plan and writes a small placeholder MP4
#[derive(Default)]
pub struct FakeEncoder {
    pub plans: Mutex<Vec<EncodePlan>>,
}

#[async_trait]
impl VideoEncoder for FakeEncoder {
    async fn probe_duration(&self, _audio: &Path) -> autoread::Result<f64> {
        Ok(12.5)
    }

    async fn encode(&self, plan: &EncodePlan) -> autoread::Result<()> {
        if let Ok(mut plans) = self.plans.lock() {
            plans.push(plan.clone());
        }
        if let Some(parent) = plan.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&plan.output, b"\0\0\0\x18ftypmp42fake").await?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Build fake adapters; returns the encoder for plan inspection
pub fn fake_adapters(speech_fails: bool) -> (Adapters, Arc<FakeEncoder>) {
    let encoder = Arc::new(FakeEncoder::default());
    let adapters = Adapters {
        renderer: Arc::new(OfflineRenderer),
        speech: Arc::new(FakeSpeech { fail: speech_fails }),
        encoder: encoder.clone(),
    };
    (adapters, encoder)
}

/// Default config rooted in a fresh temp directory, with no LLM backend
pub fn test_config() -> (Config, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::default();
    config.storage.root = temp_dir.path().join("storage");
    config.llm.api_key = None;
    (config, temp_dir)
}

/// Orchestrator over fake adapters
pub async fn create_orchestrator(
    speech_fails: bool,
) -> (Arc<TaskOrchestrator>, Arc<FakeEncoder>, TempDir) {
    let (config, temp_dir) = test_config();
    let (adapters, encoder) = fake_adapters(speech_fails);
    let orchestrator = TaskOrchestrator::with_adapters(config, adapters)
        .await
        .expect("Failed to create orchestrator");
    (Arc::new(orchestrator), encoder, temp_dir)
}

/// Serve [`NEWS_HTML`] at `/news/ferris` together with its images
pub async fn news_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news/ferris"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(NEWS_HTML.as_bytes().to_vec(), "text/html"),
        )
        .mount(&server)
        .await;
    for image in ["/media/glider.png", "/media/beach.png"] {
        Mock::given(method("GET"))
            .and(path(image))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(), "image/png"))
            .mount(&server)
            .await;
    }
    server
}

//! Page rendering strategy (headless browser)

use crate::process;
use crate::storage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Viewports captured per page: the first screen and the one below it
pub const SCROLL_VIEWPORTS: u32 = 2;

/// Output of a successful render
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Serialized DOM after scripts ran
    pub html: String,
    /// Viewport screenshots, top of the page first
    pub screenshots: Vec<PathBuf>,
    /// URL the page ended up at after redirects, when the renderer knows it
    pub final_url: Option<Url>,
}

/// Primary fetch strategy: load a page in a real browser
///
/// Implementations return the rendered DOM and, when `screenshot_dir` is
/// given, try to write viewport screenshots there. Missing screenshots are
/// not an error.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `url`
    async fn render(&self, url: &Url, screenshot_dir: Option<&Path>) -> crate::Result<RenderedPage>;

    /// Whether this implementation can do real work
    fn is_available(&self) -> bool;

    /// Implementation name (for logging and `/capabilities`)
    fn name(&self) -> &'static str;
}

/// Renderer driving a headless Chromium/Chrome binary
///
/// Two invocations per page: `--dump-dom` for the DOM and `--screenshot` for
/// the capture. The window is [`SCROLL_VIEWPORTS`] screens tall so content
/// below the fold (lazy images included) is laid out, then the capture is
/// cut into one screenshot per viewport.
pub struct ChromiumRenderer {
    binary_path: PathBuf,
    timeout: Duration,
    width: u32,
    height: u32,
    user_agent: String,
}

impl ChromiumRenderer {
    /// Create a renderer with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration, width: u32, height: u32, user_agent: String) -> Self {
        Self {
            binary_path,
            timeout,
            width,
            height,
            user_agent,
        }
    }

    /// Binary names tried on PATH
    pub const CANDIDATES: &'static [&'static str] =
        &["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"];

    fn common_args(&self) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--hide-scrollbars".to_string(),
            "--lang=zh-CN".to_string(),
            format!("--user-agent={}", self.user_agent),
            format!(
                "--window-size={},{}",
                self.width,
                self.height.saturating_mul(SCROLL_VIEWPORTS)
            ),
            "--virtual-time-budget=10000".to_string(),
        ]
    }

    async fn capture(&self, url: &Url, dir: &Path) -> crate::Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir).await?;
        let full = dir.join("capture.png");
        let mut args = self.common_args();
        args.push(format!("--screenshot={}", full.display()));
        args.push(url.to_string());
        process::run(&self.binary_path, &args, self.timeout).await?;

        if tokio::fs::metadata(&full).await.is_err() {
            return Err(crate::Error::ExternalTool(
                "browser did not write a screenshot".into(),
            ));
        }

        let (source, target, viewport) = (full.clone(), dir.to_path_buf(), self.height);
        let frames = tokio::task::spawn_blocking(move || split_viewports(&source, &target, viewport))
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("screenshot split panicked: {e}")))?;
        let _ = tokio::fs::remove_file(&full).await;
        frames.map_err(|e| crate::Error::ExternalTool(format!("cannot split screenshot: {e}")))
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &Url, screenshot_dir: Option<&Path>) -> crate::Result<RenderedPage> {
        let mut args = self.common_args();
        args.push("--dump-dom".to_string());
        args.push(url.to_string());

        let output = process::run(&self.binary_path, &args, self.timeout).await?;
        let html = String::from_utf8_lossy(&output.stdout).into_owned();
        if html.trim().is_empty() {
            return Err(crate::Error::ExternalTool(format!(
                "browser returned an empty DOM for {url}"
            )));
        }

        let screenshots = match screenshot_dir {
            Some(dir) => self.capture(url, dir).await.unwrap_or_else(|e| {
                tracing::warn!(url = %url, error = %e, "screenshot capture failed");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(RenderedPage {
            html,
            screenshots,
            final_url: None,
        })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// Cut a tall capture into viewport-sized screenshots
///
/// Writes at most [`SCROLL_VIEWPORTS`] frames named `screenshot_N.png` into
/// `dir`. A capture shorter than one viewport yields a single frame.
/// Blocking; call through `spawn_blocking`.
pub fn split_viewports(
    capture: &Path,
    dir: &Path,
    viewport_height: u32,
) -> image::ImageResult<Vec<PathBuf>> {
    let full = image::open(capture)?;
    let frame_height = viewport_height.clamp(1, full.height().max(1));
    let frames = (full.height() / frame_height).clamp(1, SCROLL_VIEWPORTS);

    let mut written = Vec::new();
    for i in 0..frames {
        let frame = full.crop_imm(0, i * frame_height, full.width(), frame_height);
        let path = dir.join(storage::screenshot_file_name(i as usize));
        frame.save(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Renderer used when no browser is available; always defers to the plain
/// HTTP strategy
pub struct NoOpRenderer;

#[async_trait]
impl PageRenderer for NoOpRenderer {
    async fn render(&self, _url: &Url, _screenshot_dir: Option<&Path>) -> crate::Result<RenderedPage> {
        Err(crate::Error::NotSupported(
            "Page rendering requires a Chromium binary. \
             Configure tools.browser_path or ensure chromium is in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

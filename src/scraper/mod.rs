//! Content fetching: URL → title, text, local images and screenshots
//!
//! Two strategies, tried in order:
//! 1. a [`PageRenderer`] (headless browser) that also captures screenshots
//! 2. a plain HTTP GET with browser-like headers
//!
//! Only when both fail is the fetch fatal for the task. A page that is not
//! Chinese but links to its Chinese version is replaced by that version.

pub mod html;
pub mod render;

pub use render::{ChromiumRenderer, NoOpRenderer, PageRenderer, RenderedPage};

use crate::config::ScraperConfig;
use crate::error::{Error, FetchError, Result};
use crate::storage::{self, StorageLayout};
use crate::types::{AssetKind, ChapterOutline, TaskId};
use html::ImageCandidate;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Result of the fetch stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPage {
    /// Page title (the URL when the page has none)
    pub title: String,
    /// Visible text, noise removed, truncated
    pub text: String,
    /// Downloaded image files
    pub images: Vec<PathBuf>,
    /// Captured screenshot files
    pub screenshots: Vec<PathBuf>,
}

/// A page as loaded by either strategy
struct LoadedPage {
    html: String,
    /// URL relative links resolve against (after redirects)
    base: Url,
    screenshots: Vec<PathBuf>,
}

/// Fetches pages and their images into per-task storage
pub struct ContentFetcher {
    client: reqwest::Client,
    renderer: Arc<dyn PageRenderer>,
    storage: StorageLayout,
    config: ScraperConfig,
}

impl ContentFetcher {
    /// Create a fetcher
    pub fn new(
        config: ScraperConfig,
        storage: StorageLayout,
        renderer: Arc<dyn PageRenderer>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.page_timeout)
            .build()?;
        Ok(Self {
            client,
            renderer,
            storage,
            config,
        })
    }

    /// The active rendering strategy
    pub fn renderer(&self) -> &Arc<dyn PageRenderer> {
        &self.renderer
    }

    /// Fetch `url` for task `id`, writing images and screenshots under storage
    pub async fn fetch(&self, id: TaskId, url: &str) -> Result<ScrapedPage> {
        let url = validate_url(url)?;
        let screenshot_dir = self.storage.asset_dir(AssetKind::Screenshots, id);

        let page = self.load_preferred(&url, Some(&screenshot_dir)).await?;
        let parsed = html::parse_page(
            &page.html,
            &page.base,
            self.config.max_text_chars,
            self.config.min_image_area,
        );
        let images = self.download_images(id, &parsed.images).await;

        info!(
            task_id = %id,
            url = %page.base,
            chars = parsed.text.chars().count(),
            images = images.len(),
            screenshots = page.screenshots.len(),
            "page fetched"
        );

        Ok(ScrapedPage {
            title: parsed.title.unwrap_or_else(|| url.to_string()),
            text: parsed.text,
            images,
            screenshots: page.screenshots,
        })
    }

    /// Extract a chapter outline from `url`; never fails
    ///
    /// Any error yields the URL as title and an empty chapter list.
    pub async fn extract_chapters(&self, url: &str) -> ChapterOutline {
        let empty = || ChapterOutline {
            title: url.to_string(),
            chapters: Vec::new(),
        };

        let Ok(parsed_url) = validate_url(url) else {
            return empty();
        };

        let document = match self.load_preferred(&parsed_url, None).await {
            Ok(page) => page.html,
            Err(e) => {
                warn!(url = %url, error = %e, "chapter extraction failed");
                return empty();
            }
        };

        let (title, chapters) = html::extract_outline(&document);
        ChapterOutline {
            title: title.unwrap_or_else(|| url.to_string()),
            chapters,
        }
    }

    /// Load `url`, then its Chinese version when it links to one
    ///
    /// A Chinese version that fails to load leaves the original page in place.
    async fn load_preferred(&self, url: &Url, screenshot_dir: Option<&Path>) -> Result<LoadedPage> {
        let page = self.load(url, screenshot_dir).await?;
        if !self.config.switch_to_chinese {
            return Ok(page);
        }
        let Some(variant) = html::chinese_variant(&page.html, &page.base) else {
            return Ok(page);
        };

        match self.load(&variant, screenshot_dir).await {
            Ok(switched) => {
                debug!(url = %url, variant = %variant, "switched to Chinese version");
                Ok(switched)
            }
            Err(e) => {
                debug!(url = %url, variant = %variant, error = %e, "Chinese version unavailable");
                Ok(page)
            }
        }
    }

    /// Render `url`, falling back to a plain GET
    async fn load(&self, url: &Url, screenshot_dir: Option<&Path>) -> Result<LoadedPage> {
        let primary = match self.renderer.render(url, screenshot_dir).await {
            Ok(rendered) => {
                debug!(url = %url, renderer = self.renderer.name(), "page rendered");
                let base = match rendered.final_url {
                    Some(final_url) => final_url,
                    None => self.resolve_redirects(url).await,
                };
                return Ok(LoadedPage {
                    html: rendered.html,
                    base,
                    screenshots: rendered.screenshots,
                });
            }
            Err(e) => e,
        };

        if self.renderer.is_available() {
            warn!(url = %url, error = %primary, "rendering failed, falling back to plain fetch");
        } else {
            debug!(url = %url, "no renderer available, using plain fetch");
        }
        match self.fetch_plain(url).await {
            Ok((html, base)) => Ok(LoadedPage {
                html,
                base,
                screenshots: Vec::new(),
            }),
            Err(fallback) => Err(Error::Fetch(FetchError::AllStrategiesFailed {
                url: url.to_string(),
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            })),
        }
    }

    /// Where `url` ends up after redirects; `url` itself when that can't be
    /// determined
    ///
    /// Used for renderers that don't report their final URL, so relative
    /// links in the rendered DOM resolve the way the browser resolved them.
    async fn resolve_redirects(&self, url: &Url) -> Url {
        match self
            .client
            .head(url.clone())
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .timeout(self.config.page_timeout)
            .send()
            .await
        {
            Ok(response) => response.url().clone(),
            Err(e) => {
                debug!(url = %url, error = %e, "redirect check failed");
                url.clone()
            }
        }
    }

    /// Plain GET; returns the body and the final URL after redirects
    async fn fetch_plain(&self, url: &Url) -> Result<(String, Url)> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .timeout(self.config.page_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        let final_url = response.url().clone();
        Ok((response.text().await?, final_url))
    }

    async fn download_images(&self, id: TaskId, candidates: &[ImageCandidate]) -> Vec<PathBuf> {
        let mut saved = Vec::new();
        if candidates.is_empty() {
            return saved;
        }

        let dir = self.storage.asset_dir(AssetKind::Images, id);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(task_id = %id, error = %e, "cannot create image directory");
            return saved;
        }

        for (idx, candidate) in candidates.iter().enumerate() {
            if saved.len() >= self.config.max_images {
                break;
            }
            match self.download_image(&candidate.url, &dir, idx).await {
                Ok(path) => saved.push(path),
                Err(e) => debug!(task_id = %id, url = %candidate.url, error = %e, "image skipped"),
            }
        }
        saved
    }

    async fn download_image(&self, url: &Url, dir: &Path, idx: usize) -> Result<PathBuf> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.config.image_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = &content_type
            && !ct.to_ascii_lowercase().starts_with("image/")
        {
            return Err(Error::InvalidRequest(format!("not an image: {ct}")));
        }

        let ext = storage::infer_image_extension(content_type.as_deref(), url.as_str());
        let body = response.bytes().await?;

        let (width, height) = image_dimensions(&body)
            .ok_or_else(|| Error::InvalidRequest(format!("undecodable image: {url}")))?;
        if u64::from(width) * u64::from(height) < self.config.min_image_area {
            return Err(Error::InvalidRequest(format!(
                "image too small: {width}x{height}"
            )));
        }

        let path = dir.join(storage::image_file_name(idx, ext));
        tokio::fs::write(&path, &body).await?;
        Ok(path)
    }
}

/// Pixel dimensions of an encoded image, read from its header
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Accept only absolute http(s) URLs
pub fn validate_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| {
        Error::Fetch(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        })
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs are supported"));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }
    Ok(url)
}

//! Configuration types for autoread

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Environment variable naming an optional JSON configuration file
pub const CONFIG_PATH_ENV: &str = "AUTOREAD_CONFIG";

/// Main configuration for autoread
///
/// Sub-configs are nested in the JSON form, and every field has a default, so
/// an empty object (or no file at all) is a valid configuration:
/// - [`storage`](StorageConfig) — where artifacts are written
/// - [`pipeline`](PipelineConfig) — concurrency and request defaults
/// - [`scraper`](ScraperConfig) — fetch timeouts and extraction limits
/// - [`llm`](LlmConfig) — summarization backend
/// - [`speech`](SpeechConfig) — TTS defaults and the silent fallback track
/// - [`video`](VideoConfig) — output frame geometry and codecs
/// - [`tools`](ToolsConfig) — external binary paths
/// - [`server`](ServerIntegrationConfig) — HTTP API
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage layout
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task scheduling
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Content fetching
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Summarization backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Speech synthesis
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Video encoding
    #[serde(default)]
    pub video: VideoConfig,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

/// Storage root under which `articles/`, `images/`, `screenshots/`, `videos/`
/// and `temp/` are created
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory (default: "./storage")
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

/// Task scheduling configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum pipelines running at once; the rest wait in `pending` (default: 4)
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Narration length used when a request omits `word_count` (default: 1000)
    #[serde(default = "default_word_count")]
    pub default_word_count: u32,

    /// Capacity of the event broadcast channel (default: 256)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
            default_word_count: default_word_count(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Content fetching configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Timeout for the plain page GET (default: 30 seconds)
    #[serde(default = "default_page_timeout", with = "duration_serde")]
    pub page_timeout: Duration,

    /// Timeout per image download (default: 20 seconds)
    #[serde(default = "default_image_timeout", with = "duration_serde")]
    pub image_timeout: Duration,

    /// Timeout for one headless browser invocation (default: 45 seconds)
    #[serde(default = "default_render_timeout", with = "duration_serde")]
    pub render_timeout: Duration,

    /// Extracted text is cut to this many characters (default: 10000)
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Maximum images downloaded per page (default: 20)
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Images whose width×height (declared, or decoded after download) is
    /// below this are skipped (default: 10000)
    #[serde(default = "default_min_image_area")]
    pub min_image_area: u64,

    /// User-Agent for the plain fetch strategy and image downloads
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language for the plain fetch strategy
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Follow a page's Chinese-language link when the page itself is not
    /// Chinese (default: true)
    #[serde(default = "default_true")]
    pub switch_to_chinese: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_timeout: default_page_timeout(),
            image_timeout: default_image_timeout(),
            render_timeout: default_render_timeout(),
            max_text_chars: default_max_text_chars(),
            max_images: default_max_images(),
            min_image_area: default_min_image_area(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            switch_to_chinese: true,
        }
    }
}

/// Summarization backend (any OpenAI-compatible chat completions endpoint)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL, without the `/chat/completions` suffix
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key; without one the summarizer produces a placeholder narration
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout (default: 120 seconds)
    #[serde(default = "default_llm_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Source text is cut to this many characters in the prompt (default: 8000)
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            request_timeout: default_llm_timeout(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Voice used for Chinese narration when none is requested
    #[serde(default = "default_zh_voice")]
    pub default_zh_voice: String,

    /// Voice used for other narration when none is requested
    #[serde(default = "default_en_voice")]
    pub default_en_voice: String,

    /// Text spoken by `POST /tts/preview` when none is given
    #[serde(default = "default_preview_text")]
    pub preview_text: String,

    /// Characters per second assumed for the silent fallback (default: 14)
    #[serde(default = "default_fallback_chars_per_sec")]
    pub fallback_chars_per_sec: u32,

    /// Shortest silent fallback in seconds (default: 6)
    #[serde(default = "default_fallback_min_secs")]
    pub fallback_min_secs: u32,

    /// Longest silent fallback in seconds (default: 120)
    #[serde(default = "default_fallback_max_secs")]
    pub fallback_max_secs: u32,

    /// Silent fallback sample rate (default: 22050)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Timeout for one synthesis run (default: 120 seconds)
    #[serde(default = "default_synthesis_timeout", with = "duration_serde")]
    pub synthesis_timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            default_zh_voice: default_zh_voice(),
            default_en_voice: default_en_voice(),
            preview_text: default_preview_text(),
            fallback_chars_per_sec: default_fallback_chars_per_sec(),
            fallback_min_secs: default_fallback_min_secs(),
            fallback_max_secs: default_fallback_max_secs(),
            sample_rate: default_sample_rate(),
            synthesis_timeout: default_synthesis_timeout(),
        }
    }
}

/// Video output configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Frame width (default: 1920)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height (default: 1080)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Frames per second (default: 24)
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Placeholder frame colour as RRGGBB (default: "0f172a")
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: String,

    /// Video codec passed to the encoder (default: "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio codec passed to the encoder (default: "aac")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Timeout for one encoder run (default: 600 seconds)
    #[serde(default = "default_encode_timeout", with = "duration_serde")]
    pub encode_timeout: Duration,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            placeholder_color: default_placeholder_color(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            encode_timeout: default_encode_timeout(),
        }
    }
}

/// External tool paths
///
/// An explicit path wins; otherwise the binary is searched on PATH when
/// `search_path` is set. A tool that is not found is replaced by a no-op
/// implementation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Headless Chromium/Chrome binary
    #[serde(default)]
    pub browser_path: Option<PathBuf>,

    /// `edge-tts` CLI
    #[serde(default)]
    pub edge_tts_path: Option<PathBuf>,

    /// `ffmpeg` binary
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// `ffprobe` binary
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Search PATH for tools without an explicit path (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            browser_path: None,
            edge_tts_path: None,
            ffmpeg_path: None,
            ffprobe_path: None,
            search_path: true,
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {e}", path.display()),
            key: None,
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {e}", path.display()),
            key: None,
        })
    }

    /// Load configuration the way the server binary does
    ///
    /// Reads the file named by `AUTOREAD_CONFIG` if set, otherwise starts from
    /// defaults, then applies environment overrides and validates.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    ///
    /// Recognized keys: `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_API_KEY`,
    /// `AUTOREAD_BIND`, `AUTOREAD_STORAGE`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(api_key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Some(bind) = get("AUTOREAD_BIND") {
            self.server.api.bind_address = bind.parse().map_err(|e| Error::Config {
                message: format!("invalid bind address '{bind}': {e}"),
                key: Some("AUTOREAD_BIND".to_string()),
            })?;
        }
        if let Some(root) = get("AUTOREAD_STORAGE") {
            self.storage.root = PathBuf::from(root);
        }
        Ok(())
    }

    /// Reject values no pipeline could run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| {
            Err(Error::Config {
                message: message.to_string(),
                key: Some(key.to_string()),
            })
        };

        if self.pipeline.max_concurrent_tasks == 0 {
            return invalid("pipeline.max_concurrent_tasks", "must be at least 1");
        }
        if self.pipeline.default_word_count == 0 {
            return invalid("pipeline.default_word_count", "must be at least 1");
        }
        if self.pipeline.event_buffer == 0 {
            return invalid("pipeline.event_buffer", "must be at least 1");
        }
        if self.video.width == 0 || self.video.height == 0 {
            return invalid("video.width", "frame size must be non-zero");
        }
        if self.video.fps == 0 {
            return invalid("video.fps", "must be at least 1");
        }
        if !is_hex_color(&self.video.placeholder_color) {
            return invalid("video.placeholder_color", "must be six hex digits (RRGGBB)");
        }
        if self.speech.fallback_chars_per_sec == 0 {
            return invalid("speech.fallback_chars_per_sec", "must be at least 1");
        }
        if self.speech.fallback_min_secs > self.speech.fallback_max_secs {
            return invalid(
                "speech.fallback_min_secs",
                "must not exceed speech.fallback_max_secs",
            );
        }
        if self.speech.sample_rate == 0 {
            return invalid("speech.sample_rate", "must be non-zero");
        }
        if url::Url::parse(&self.llm.base_url).is_err() {
            return invalid("llm.base_url", "must be an absolute URL");
        }
        Ok(())
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_max_concurrent_tasks() -> usize {
    4
}

fn default_word_count() -> u32 {
    1000
}

fn default_event_buffer() -> usize {
    256
}

fn default_page_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_image_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_render_timeout() -> Duration {
    Duration::from_secs(45)
}

fn default_max_text_chars() -> usize {
    10_000
}

fn default_max_images() -> usize {
    20
}

fn default_min_image_area() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) AutoRead/1.0"
        .to_string()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9,en;q=0.8".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_llm_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_prompt_chars() -> usize {
    8_000
}

fn default_zh_voice() -> String {
    "zh-CN-XiaoxiaoNeural".to_string()
}

fn default_en_voice() -> String {
    "en-US-AriaNeural".to_string()
}

fn default_preview_text() -> String {
    "你好，这是 Auto Read 的试听片段。祝您使用愉快！".to_string()
}

fn default_fallback_chars_per_sec() -> u32 {
    14
}

fn default_fallback_min_secs() -> u32 {
    6
}

fn default_fallback_max_secs() -> u32 {
    120
}

fn default_sample_rate() -> u32 {
    22_050
}

fn default_synthesis_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_fps() -> u32 {
    24
}

fn default_placeholder_color() -> String {
    "0f172a".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_encode_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

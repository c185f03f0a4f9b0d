//! Core types for autoread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Created, waiting for a pipeline slot
    Pending,
    /// A stage is running
    Processing,
    /// All stages finished, artifacts available
    Completed,
    /// A stage failed fatally
    Failed,
}

impl Status {
    /// Whether no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Scrape text, images and screenshots
    Fetch,
    /// Produce narration with the LLM
    Summarize,
    /// Synthesize speech and encode the video
    Compose,
}

impl Stage {
    /// Progress value recorded when the stage starts
    pub fn start_progress(&self) -> u8 {
        match self {
            Stage::Fetch => 10,
            Stage::Summarize => 40,
            Stage::Compose => 70,
        }
    }

    /// Status message recorded when the stage starts
    pub fn start_message(&self) -> &'static str {
        match self {
            Stage::Fetch => "Scraping web content...",
            Stage::Summarize => "Analyzing content with AI...",
            Stage::Compose => "Generating video...",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => f.write_str("fetch"),
            Stage::Summarize => f.write_str("summarize"),
            Stage::Compose => f.write_str("compose"),
        }
    }
}

/// Whether a stage produced its real output or a labelled substitute
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The collaborator produced genuine output
    Real,
    /// A substitute was produced instead
    Degraded {
        /// Why the substitute was used
        reason: String,
    },
}

impl Outcome {
    /// Build a degraded outcome
    pub fn degraded(reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            reason: reason.into(),
        }
    }

    /// True for [`Outcome::Degraded`]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }
}

/// Metadata about the summarization backend used for a task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LlmMeta {
    /// True only if the backend was really invoked and answered
    pub enabled: bool,
    /// Backend base URL that was (or would have been) used
    pub base_url: String,
    /// Model name that was (or would have been) used
    pub model: String,
    /// Backend error, if the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Real or degraded narration
    pub outcome: Outcome,
}

/// Metadata about speech synthesis for a task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TtsMeta {
    /// Voice id used
    pub voice: String,
    /// True when the audio track is generated silence
    pub audio_fallback: bool,
    /// Real or degraded audio
    pub outcome: Outcome,
}

/// Per-request LLM overrides
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LlmOverride {
    /// OpenAI-compatible base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name
    #[serde(default)]
    pub model: Option<String>,
    /// API key (empty string is treated as absent)
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Request body for `POST /process`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessRequest {
    /// Absolute http(s) URL of the article
    pub url: String,
    /// Accepted for client compatibility, ignored
    #[serde(default)]
    pub user_id: Option<String>,
    /// LLM overrides
    #[serde(default)]
    pub llm: Option<LlmOverride>,
    /// Chapter titles to focus the narration on
    #[serde(default)]
    pub chapters: Option<Vec<String>>,
    /// Voice id override
    #[serde(default)]
    pub voice: Option<String>,
    /// Target narration length in words
    #[serde(default)]
    pub word_count: Option<u32>,
}

/// Options captured at submission; immutable once the task starts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskConfig {
    /// LLM overrides with empty strings removed
    pub llm: LlmOverride,
    /// Chapter focus list
    pub chapters: Vec<String>,
    /// Voice override
    pub voice: Option<String>,
    /// Target narration length in words
    pub word_count: u32,
}

impl TaskConfig {
    /// Normalize a request into the captured task options
    pub fn from_request(req: &ProcessRequest, default_word_count: u32) -> Self {
        let non_empty = |v: &Option<String>| {
            v.as_ref()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let llm = req
            .llm
            .as_ref()
            .map(|o| LlmOverride {
                base_url: non_empty(&o.base_url),
                model: non_empty(&o.model),
                api_key: non_empty(&o.api_key),
            })
            .unwrap_or_default();

        Self {
            llm,
            chapters: req
                .chapters
                .clone()
                .unwrap_or_default()
                .into_iter()
                .filter(|c| !c.trim().is_empty())
                .collect(),
            voice: non_empty(&req.voice),
            word_count: req
                .word_count
                .filter(|wc| *wc > 0)
                .unwrap_or(default_word_count),
        }
    }
}

/// Artifact paths produced by a task
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifacts {
    /// Raw extracted content markdown
    pub source_markdown: Option<PathBuf>,
    /// Narration markdown
    pub article_markdown: Option<PathBuf>,
    /// Downloaded images
    pub images: Vec<PathBuf>,
    /// Captured screenshots
    pub screenshots: Vec<PathBuf>,
    /// Encoded video
    pub video: Option<PathBuf>,
    /// Visuals actually placed in the video
    pub visuals_used: Vec<PathBuf>,
}

/// Response body for `POST /process`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessResponse {
    /// Newly created task id
    pub task_id: TaskId,
    /// Always `pending`
    pub status: Status,
    /// Human-readable message
    pub message: String,
}

/// Response body for `GET /status/{task_id}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskStatusResponse {
    /// Task id
    pub task_id: TaskId,
    /// Source URL
    pub url: String,
    /// Current status
    pub status: Status,
    /// Progress 0-100
    pub progress: u8,
    /// Current stage description
    pub message: String,
    /// Narration markdown exists
    pub has_article: bool,
    /// Video exists
    pub has_video: bool,
    /// Source markdown exists
    pub has_source: bool,
    /// Number of downloaded images
    pub image_count: usize,
    /// Number of captured screenshots
    pub screenshot_count: usize,
    /// Number of visuals used in the video
    pub visual_count: usize,
    /// Summarization metadata
    pub llm_meta: Option<LlmMeta>,
    /// Speech metadata
    pub tts_meta: Option<TtsMeta>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

/// Which markdown document to read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownKind {
    /// `{task_id}.source.md`
    Source,
    /// `{task_id}.md`
    Article,
}

impl FromStr for MarkdownKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(MarkdownKind::Source),
            "article" => Ok(MarkdownKind::Article),
            _ => Err(Error::InvalidRequest("Invalid markdown kind".into())),
        }
    }
}

/// Which per-task asset directory to read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// `images/{task_id}/`
    Images,
    /// `screenshots/{task_id}/`
    Screenshots,
}

impl AssetKind {
    /// Directory name under the storage root
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Images => "images",
            AssetKind::Screenshots => "screenshots",
        }
    }
}

impl FromStr for AssetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" => Ok(AssetKind::Images),
            "screenshots" => Ok(AssetKind::Screenshots),
            _ => Err(Error::InvalidRequest("Invalid asset type".into())),
        }
    }
}

/// Which finished artifact to download
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    /// Narration markdown
    Article,
    /// Encoded MP4
    Video,
}

impl DownloadKind {
    /// Fixed attachment name
    pub fn download_name(&self) -> &'static str {
        match self {
            DownloadKind::Article => "summary.md",
            DownloadKind::Video => "video.mp4",
        }
    }

    /// Content-Type header value
    pub fn content_type(&self) -> &'static str {
        match self {
            DownloadKind::Article => "text/markdown; charset=utf-8",
            DownloadKind::Video => "video/mp4",
        }
    }
}

impl FromStr for DownloadKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(DownloadKind::Article),
            "video" => Ok(DownloadKind::Video),
            _ => Err(Error::InvalidRequest("Invalid download type".into())),
        }
    }
}

/// Response body for `GET /task/{task_id}/markdown/{kind}`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkdownResponse {
    /// Task id
    pub task_id: TaskId,
    /// Document kind
    pub kind: MarkdownKind,
    /// File contents
    pub markdown: String,
}

/// A single asset reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetLink {
    /// File base name
    pub name: String,
    /// Relative URL serving the raw file
    pub url: String,
}

/// Response body for `GET /task/{task_id}/assets`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssetListing {
    /// Task id
    pub task_id: TaskId,
    /// Downloaded images
    pub images: Vec<AssetLink>,
    /// Captured screenshots
    pub screenshots: Vec<AssetLink>,
    /// Sorted, deduplicated base names of visuals used in the video
    pub visuals_used: Vec<String>,
}

/// One entry of a chapter outline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Chapter {
    /// Fresh random id
    pub id: String,
    /// Heading text
    pub text: String,
    /// 1-3 for h1-h3, 4 for numbered paragraphs
    pub level: u8,
}

/// Response body for `POST /extract-chapters`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChapterOutline {
    /// Page title, or the URL when unavailable
    pub title: String,
    /// At most 20 entries
    pub chapters: Vec<Chapter>,
}

/// Request body for `POST /extract-chapters`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractChaptersRequest {
    /// Page URL
    pub url: String,
}

/// A voice in the static catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoiceInfo {
    /// Engine voice id
    pub id: String,
    /// Display name
    pub name: String,
    /// Locale
    pub lang: String,
}

/// Request body for `POST /tts/preview`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VoicePreviewRequest {
    /// Voice id
    pub voice: String,
    /// Text to speak (a fixed sample sentence when omitted)
    #[serde(default)]
    pub text: Option<String>,
}

/// Event emitted during the task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task created and waiting for a pipeline slot
    Queued {
        /// Task ID
        id: TaskId,
        /// Source URL
        url: String,
    },

    /// A stage began
    StageStarted {
        /// Task ID
        id: TaskId,
        /// Stage name
        stage: Stage,
        /// Progress recorded at stage start
        progress: u8,
    },

    /// Task completed successfully
    Completed {
        /// Task ID
        id: TaskId,
        /// Path of the encoded video
        #[schema(value_type = String)]
        video_path: PathBuf,
    },

    /// Task failed
    Failed {
        /// Task ID
        id: TaskId,
        /// Error message
        error: String,
    },

    /// Orchestrator is shutting down
    Shutdown,
}

/// Information about one external collaborator
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdapterInfo {
    /// Implementation name (e.g. "chromium", "noop")
    pub name: String,
    /// Whether the implementation can do real work
    pub available: bool,
}

/// Which collaborators are active
///
/// Selected once at construction, based on configuration and the binaries
/// found on the host.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Page renderer (primary fetch strategy)
    pub renderer: AdapterInfo,
    /// Speech synthesizer
    pub speech: AdapterInfo,
    /// Video encoder
    pub encoder: AdapterInfo,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique_and_parse_back() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<TaskId>().unwrap(), a);
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    #[test]
    fn task_id_serializes_as_plain_string() {
        let id = TaskId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[test]
    fn status_wire_names_are_lowercase() {
        for (status, name) in [
            (Status::Pending, "pending"),
            (Status::Processing, "processing"),
            (Status::Completed, "completed"),
            (Status::Failed, "failed"),
        ] {
            assert_eq!(serde_json::to_value(status).unwrap(), name);
            assert_eq!(status.to_string(), name);
        }
        assert!(Status::Completed.is_terminal());
        assert!(Status::Failed.is_terminal());
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Processing.is_terminal());
    }

    #[test]
    fn stage_milestones_increase() {
        assert!(Stage::Fetch.start_progress() < Stage::Summarize.start_progress());
        assert!(Stage::Summarize.start_progress() < Stage::Compose.start_progress());
        assert_eq!(Stage::Compose.start_message(), "Generating video...");
    }

    #[test]
    fn outcome_is_tagged() {
        let json = serde_json::to_value(Outcome::degraded("no key")).unwrap();
        assert_eq!(json["kind"], "degraded");
        assert_eq!(json["reason"], "no key");
        assert_eq!(serde_json::to_value(Outcome::Real).unwrap()["kind"], "real");
    }

    #[test]
    fn task_config_drops_empty_overrides() {
        let req: ProcessRequest = serde_json::from_value(serde_json::json!({
            "url": "https://example.com",
            "user_id": "someone",
            "llm": {"base_url": "", "model": "m", "api_key": "   "},
            "chapters": ["Intro", " "],
            "voice": ""
        }))
        .unwrap();

        let config = TaskConfig::from_request(&req, 1000);
        assert_eq!(config.llm.base_url, None);
        assert_eq!(config.llm.model.as_deref(), Some("m"));
        assert_eq!(config.llm.api_key, None);
        assert_eq!(config.chapters, vec!["Intro".to_string()]);
        assert_eq!(config.voice, None);
        assert_eq!(config.word_count, 1000);
    }

    #[test]
    fn task_config_keeps_explicit_word_count() {
        let req: ProcessRequest = serde_json::from_value(serde_json::json!({
            "url": "https://example.com",
            "word_count": 300
        }))
        .unwrap();
        assert_eq!(TaskConfig::from_request(&req, 1000).word_count, 300);
    }

    #[test]
    fn kinds_parse_and_reject() {
        assert_eq!("source".parse::<MarkdownKind>().unwrap(), MarkdownKind::Source);
        assert_eq!("article".parse::<MarkdownKind>().unwrap(), MarkdownKind::Article);
        assert!("video".parse::<MarkdownKind>().is_err());

        assert_eq!("images".parse::<AssetKind>().unwrap().dir_name(), "images");
        assert!("videos".parse::<AssetKind>().is_err());

        assert_eq!("video".parse::<DownloadKind>().unwrap().download_name(), "video.mp4");
        assert_eq!(
            "article".parse::<DownloadKind>().unwrap().download_name(),
            "summary.md"
        );
        assert!("source".parse::<DownloadKind>().is_err());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::StageStarted {
            id: TaskId::new(),
            stage: Stage::Summarize,
            progress: 40,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stage_started");
        assert_eq!(json["stage"], "summarize");
        assert_eq!(json["progress"], 40);
    }
}

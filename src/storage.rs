//! Storage layout and path helpers
//!
//! Every artifact lives under one root:
//!
//! ```text
//! {root}/articles/{task_id}.source.md
//! {root}/articles/{task_id}.md
//! {root}/images/{task_id}/image_N.ext
//! {root}/screenshots/{task_id}/screenshot_N.png
//! {root}/videos/{task_id}.mp4
//! {root}/temp/{task_id}.mp3 | {task_id}.wav | preview_*.mp3
//! ```

use crate::error::{Error, Result};
use crate::types::{AssetKind, TaskId};
use std::path::{Path, PathBuf};

/// Paths of everything the service writes
#[derive(Clone, Debug)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the top-level directories
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.articles_dir(),
            self.root.join("images"),
            self.root.join("screenshots"),
            self.videos_dir(),
            self.temp_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to create directory '{}': {}", dir.display(), e),
                ))
            })?;
        }
        Ok(())
    }

    /// `articles/`
    pub fn articles_dir(&self) -> PathBuf {
        self.root.join("articles")
    }

    /// `videos/`
    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    /// `temp/`
    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    /// Extracted content markdown for a task
    pub fn source_markdown_path(&self, id: TaskId) -> PathBuf {
        self.articles_dir().join(format!("{id}.source.md"))
    }

    /// Narration markdown for a task
    pub fn article_markdown_path(&self, id: TaskId) -> PathBuf {
        self.articles_dir().join(format!("{id}.md"))
    }

    /// Per-task asset directory
    pub fn asset_dir(&self, kind: AssetKind, id: TaskId) -> PathBuf {
        self.root.join(kind.dir_name()).join(id.to_string())
    }

    /// Encoded video for a task
    pub fn video_path(&self, id: TaskId) -> PathBuf {
        self.videos_dir().join(format!("{id}.mp4"))
    }

    /// Synthesized speech for a task
    pub fn speech_path(&self, id: TaskId) -> PathBuf {
        self.temp_dir().join(format!("{id}.mp3"))
    }

    /// Silent fallback track for a task
    pub fn fallback_audio_path(&self, id: TaskId) -> PathBuf {
        self.temp_dir().join(format!("{id}.wav"))
    }

    /// Cached voice preview, keyed by voice and a digest of the spoken text
    pub fn preview_path(&self, voice: &str, text_digest: &str) -> PathBuf {
        let voice = voice.replace(|c: char| !c.is_ascii_alphanumeric() && c != '-', "_");
        self.temp_dir()
            .join(format!("preview_{voice}_{text_digest}.mp3"))
    }

    /// Resolve a client-supplied asset name to a path inside the task's asset
    /// directory
    ///
    /// The name is reduced to its base name first, so traversal segments never
    /// escape the directory.
    pub fn resolve_asset(&self, kind: AssetKind, id: TaskId, raw_name: &str) -> Result<PathBuf> {
        let name = sanitize_filename(raw_name)?;
        Ok(self.asset_dir(kind, id).join(name))
    }
}

/// Reduce a client-supplied file name to a safe base name
///
/// Both `/` and `\` are treated as separators. Empty names, `.`, `..` and
/// names containing NUL are rejected.
///
/// # Examples
///
/// ```
/// use autoread::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
/// assert!(sanitize_filename("..").is_err());
/// ```
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let base = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return Err(Error::InvalidRequest(format!("Invalid file name '{raw}'")));
    }
    Ok(base.to_string())
}

/// File name for the `idx`-th (zero-based) viewport screenshot
pub fn screenshot_file_name(idx: usize) -> String {
    format!("screenshot_{}.png", idx + 1)
}

/// File name for the `idx`-th (zero-based) downloaded image
pub fn image_file_name(idx: usize, ext: &str) -> String {
    format!("image_{}{}", idx + 1, ext)
}

/// Pick an image file extension
///
/// The response content type wins, then the URL path suffix, then `.jpg`.
/// `.jpeg` is normalized to `.jpg`.
pub fn infer_image_extension(content_type: Option<&str>, url: &str) -> &'static str {
    if let Some(ct) = content_type {
        let ct = ct.to_ascii_lowercase();
        if ct.contains("png") {
            return ".png";
        }
        if ct.contains("webp") {
            return ".webp";
        }
        if ct.contains("gif") {
            return ".gif";
        }
        if ct.contains("jpeg") || ct.contains("jpg") {
            return ".jpg";
        }
    }

    let path = url::Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase());
    for (suffix, ext) in [
        (".png", ".png"),
        (".webp", ".webp"),
        (".gif", ".gif"),
        (".jpeg", ".jpg"),
        (".jpg", ".jpg"),
    ] {
        if path.ends_with(suffix) {
            return ext;
        }
    }
    ".jpg"
}

/// Content type for a stored file, by extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("md") => "text/markdown; charset=utf-8",
        _ => "application/octet-stream",
    }
}

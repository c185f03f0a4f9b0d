//! Read-side operations: status, artifacts, chapters, voices and previews.

use crate::composer::{is_nonempty_file, voices};
use crate::error::{Error, Result, TaskError};
use crate::types::{
    AssetKind, AssetLink, AssetListing, ChapterOutline, DownloadKind, MarkdownKind,
    MarkdownResponse, Status, TaskId, TaskStatusResponse, VoiceInfo, VoicePreviewRequest,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::TaskOrchestrator;

/// Base name of `path`, lossy
fn base_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Relative URL serving one asset
pub fn asset_url(id: TaskId, kind: AssetKind, name: &str) -> String {
    format!("/task/{id}/asset/{}/{name}", kind.dir_name())
}

impl TaskOrchestrator {
    /// Status projection of `id`
    pub async fn status(&self, id: TaskId) -> Result<TaskStatusResponse> {
        self.registry.status(id).await
    }

    /// Contents of the source or article markdown of `id`
    pub async fn markdown(&self, id: TaskId, kind: MarkdownKind) -> Result<MarkdownResponse> {
        let record = self.registry.get(id).await?;
        let path = match kind {
            MarkdownKind::Source => record.artifacts.source_markdown,
            MarkdownKind::Article => record.artifacts.article_markdown,
        }
        .ok_or_else(|| Error::NotFound(format!("{kind:?} markdown not available for task {id}")))?;

        let markdown = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("{kind:?} markdown file missing for task {id}"))
            }
            _ => Error::Io(e),
        })?;

        Ok(MarkdownResponse {
            task_id: id,
            kind,
            markdown,
        })
    }

    /// Images, screenshots and visuals recorded for `id`
    pub async fn assets(&self, id: TaskId) -> Result<AssetListing> {
        let record = self.registry.get(id).await?;
        let links = |kind: AssetKind, paths: &[PathBuf]| -> Vec<AssetLink> {
            paths
                .iter()
                .filter_map(|p| base_name(p))
                .map(|name| AssetLink {
                    url: asset_url(id, kind, &name),
                    name,
                })
                .collect()
        };

        let visuals_used: BTreeSet<String> = record
            .artifacts
            .visuals_used
            .iter()
            .filter_map(|p| base_name(p))
            .collect();

        Ok(AssetListing {
            task_id: id,
            images: links(AssetKind::Images, &record.artifacts.images),
            screenshots: links(AssetKind::Screenshots, &record.artifacts.screenshots),
            visuals_used: visuals_used.into_iter().collect(),
        })
    }

    /// Path of one asset file of `id`
    ///
    /// The file name is reduced to its base name, so the result is always
    /// inside the task's asset directory.
    pub async fn asset_path(&self, id: TaskId, kind: AssetKind, file_name: &str) -> Result<PathBuf> {
        self.registry.get(id).await?;
        let path = self.storage.resolve_asset(kind, id, file_name)?;

        if !is_nonempty_file(&path).await {
            return Err(Error::NotFound(format!(
                "asset '{}' not found for task {id}",
                base_name(&path).unwrap_or_default()
            )));
        }
        Ok(path)
    }

    /// Path of a downloadable artifact of a completed task
    ///
    /// # Errors
    ///
    /// - task unknown → not found
    /// - task not `completed` → [`TaskError::NotCompleted`]
    /// - artifact missing on disk → not found
    pub async fn download_path(&self, id: TaskId, kind: DownloadKind) -> Result<PathBuf> {
        let record = self.registry.get(id).await?;
        if record.status != Status::Completed {
            return Err(Error::Task(TaskError::NotCompleted {
                id,
                status: record.status,
            }));
        }

        let path = match kind {
            DownloadKind::Article => record.artifacts.article_markdown,
            DownloadKind::Video => record.artifacts.video,
        }
        .ok_or_else(|| Error::NotFound(format!("{kind:?} not available for task {id}")))?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::NotFound(format!("{kind:?} file missing for task {id}")));
        }
        Ok(path)
    }

    /// Chapter outline of `url`; never fails
    pub async fn extract_chapters(&self, url: &str) -> ChapterOutline {
        self.media.fetcher.extract_chapters(url.trim()).await
    }

    /// Static voice catalog
    pub fn voices(&self) -> Vec<VoiceInfo> {
        voices::catalog()
    }

    /// Audio sample of a voice
    pub async fn preview_voice(&self, request: &VoicePreviewRequest) -> Result<PathBuf> {
        self.media
            .composer
            .preview(&request.voice, request.text.as_deref())
            .await
    }
}

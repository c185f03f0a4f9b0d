//! Fetch → summarize → compose, and the single place that fails a task.

use crate::composer::ComposedVideo;
use crate::error::{Error, Result};
use crate::scraper::ScrapedPage;
use crate::summarizer::{Narration, SummaryOptions};
use crate::types::{Event, Stage, TaskConfig, TaskId, TtsMeta};
use std::path::Path;

use super::TaskOrchestrator;

/// Contents of `{task_id}.source.md`
pub(crate) fn source_markdown(title: &str, text: &str) -> String {
    format!("# {title}\n\n## Extracted Content\n\n{text}\n")
}

/// Contents of `{task_id}.md`
pub(crate) fn article_markdown(title: &str, narration: &str) -> String {
    format!("# {title}\n\n{narration}")
}

impl TaskOrchestrator {
    /// Run every stage for `id` and record the terminal state
    pub(crate) async fn run_pipeline(&self, id: TaskId, url: &str, config: &TaskConfig) {
        tracing::debug!(task_id = %id, "pipeline started");

        match self.execute_stages(id, url, config).await {
            Ok(video) => {
                if let Err(e) = self.registry.complete(id).await {
                    tracing::error!(task_id = %id, error = %e, "failed to mark task completed");
                    return;
                }
                tracing::info!(task_id = %id, video = %video.video_path.display(), "task completed");
                self.emit_event(Event::Completed {
                    id,
                    video_path: video.video_path,
                });
            }
            Err(e) => self.finish_failed(id, &e).await,
        }
    }

    /// Mark `id` failed with `error`
    pub(crate) async fn finish_failed(&self, id: TaskId, error: &Error) {
        tracing::error!(task_id = %id, error = %error, "task failed");
        if let Err(e) = self.registry.fail(id, &error.to_string()).await {
            tracing::error!(task_id = %id, error = %e, "failed to mark task failed");
        }
        self.emit_event(Event::Failed {
            id,
            error: error.to_string(),
        });
    }

    async fn execute_stages(&self, id: TaskId, url: &str, config: &TaskConfig) -> Result<ComposedVideo> {
        let page = self.run_fetch_stage(id, url).await?;
        let narration = self.run_summarize_stage(id, &page, config).await?;
        self.run_compose_stage(id, &narration, &page, config).await
    }

    async fn begin_stage(&self, id: TaskId, stage: Stage) -> Result<()> {
        self.registry.begin_stage(id, stage).await?;
        tracing::debug!(task_id = %id, stage = %stage, "stage started");
        self.emit_event(Event::StageStarted {
            id,
            stage,
            progress: stage.start_progress(),
        });
        Ok(())
    }

    async fn run_fetch_stage(&self, id: TaskId, url: &str) -> Result<ScrapedPage> {
        self.begin_stage(id, Stage::Fetch).await?;

        let page = self.media.fetcher.fetch(id, url).await?;

        let source_path = self.storage.source_markdown_path(id);
        write_markdown(&source_path, &source_markdown(&page.title, &page.text)).await?;

        self.registry
            .record_fetch(id, source_path, page.images.clone(), page.screenshots.clone())
            .await?;
        Ok(page)
    }

    async fn run_summarize_stage(
        &self,
        id: TaskId,
        page: &ScrapedPage,
        config: &TaskConfig,
    ) -> Result<Narration> {
        self.begin_stage(id, Stage::Summarize).await?;

        let options = SummaryOptions {
            word_count: config.word_count,
            chapters: config.chapters.clone(),
            llm: config.llm.clone(),
        };
        let narration = self.media.summarizer.summarize(&page.text, &options).await;
        if narration.meta.outcome.is_degraded() {
            tracing::warn!(task_id = %id, outcome = ?narration.meta.outcome, "narration degraded");
        }

        let article_path = self.storage.article_markdown_path(id);
        write_markdown(&article_path, &article_markdown(&page.title, &narration.text)).await?;

        self.registry
            .record_summary(id, article_path, narration.meta.clone())
            .await?;
        Ok(narration)
    }

    async fn run_compose_stage(
        &self,
        id: TaskId,
        narration: &Narration,
        page: &ScrapedPage,
        config: &TaskConfig,
    ) -> Result<ComposedVideo> {
        self.begin_stage(id, Stage::Compose).await?;

        let video = self
            .media
            .composer
            .compose(
                id,
                &narration.text,
                &page.images,
                &page.screenshots,
                config.voice.as_deref(),
            )
            .await?;

        self.registry
            .record_composition(
                id,
                video.video_path.clone(),
                video.visuals_used.clone(),
                TtsMeta {
                    voice: video.voice.clone(),
                    audio_fallback: video.audio_fallback,
                    outcome: video.outcome.clone(),
                },
            )
            .await?;
        Ok(video)
    }
}

async fn write_markdown(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to write '{}': {}", path.display(), e),
        ))
    })
}

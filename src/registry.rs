//! In-memory task registry
//!
//! Holds one [`TaskRecord`] per submitted request. Every mutation takes the
//! write lock once, refuses to touch a terminal task and stamps `updated_at`.
//! Progress never decreases.

use crate::error::{Error, Result, TaskError};
use crate::types::{
    Artifacts, LlmMeta, Stage, Status, TaskConfig, TaskId, TaskStatusResponse, TtsMeta,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Message recorded when a task is created
pub const CREATED_MESSAGE: &str = "Task created";

/// Message recorded when a task completes
pub const COMPLETED_MESSAGE: &str = "Task completed successfully!";

/// A single task and everything it has produced so far
#[derive(Clone, Debug)]
pub struct TaskRecord {
    /// Task id
    pub id: TaskId,
    /// Source URL
    pub url: String,
    /// Lifecycle status
    pub status: Status,
    /// Progress 0-100
    pub progress: u8,
    /// Current stage description
    pub message: String,
    /// Options captured at submission
    pub config: TaskConfig,
    /// Artifact paths
    pub artifacts: Artifacts,
    /// Summarization metadata
    pub llm_meta: Option<LlmMeta>,
    /// Speech metadata
    pub tts_meta: Option<TtsMeta>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A fresh `pending` record at progress 0
    pub fn new(id: TaskId, url: impl Into<String>, config: TaskConfig) -> Self {
        let now = Utc::now();
        Self {
            id,
            url: url.into(),
            status: Status::Pending,
            progress: 0,
            message: CREATED_MESSAGE.to_string(),
            config,
            artifacts: Artifacts::default(),
            llm_meta: None,
            tts_meta: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Project the record onto the status endpoint's response shape
    pub fn to_status_response(&self) -> TaskStatusResponse {
        TaskStatusResponse {
            task_id: self.id,
            url: self.url.clone(),
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            has_article: self.artifacts.article_markdown.is_some(),
            has_video: self.artifacts.video.is_some(),
            has_source: self.artifacts.source_markdown.is_some(),
            image_count: self.artifacts.images.len(),
            screenshot_count: self.artifacts.screenshots.len(),
            visual_count: self.artifacts.visuals_used.len(),
            llm_meta: self.llm_meta.clone(),
            tts_meta: self.tts_meta.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Shared store of task records
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record
    ///
    /// Ids are generated fresh per submission, so a collision means a caller
    /// reused one; that is rejected rather than overwriting.
    pub async fn insert(&self, record: TaskRecord) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&record.id) {
            return Err(Error::Other(format!("task {} already registered", record.id)));
        }
        tasks.insert(record.id, record);
        Ok(())
    }

    /// Clone of the record for `id`
    pub async fn get(&self, id: TaskId) -> Result<TaskRecord> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::Task(TaskError::NotFound { id }))
    }

    /// Status projection for `id`
    pub async fn status(&self, id: TaskId) -> Result<TaskStatusResponse> {
        self.tasks
            .read()
            .await
            .get(&id)
            .map(TaskRecord::to_status_response)
            .ok_or(Error::Task(TaskError::NotFound { id }))
    }

    /// Number of tasks known
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Whether no task was ever submitted
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Mark the start of `stage`
    pub async fn begin_stage(&self, id: TaskId, stage: Stage) -> Result<()> {
        self.mutate(id, |task| {
            task.status = Status::Processing;
            task.progress = task.progress.max(stage.start_progress());
            task.message = stage.start_message().to_string();
        })
        .await
    }

    /// Record fetch-stage output; image and screenshot lists are frozen after this
    pub async fn record_fetch(
        &self,
        id: TaskId,
        source_markdown: PathBuf,
        images: Vec<PathBuf>,
        screenshots: Vec<PathBuf>,
    ) -> Result<()> {
        self.mutate(id, |task| {
            task.artifacts.source_markdown.get_or_insert(source_markdown);
            if task.artifacts.images.is_empty() && task.artifacts.screenshots.is_empty() {
                task.artifacts.images = images;
                task.artifacts.screenshots = screenshots;
            }
        })
        .await
    }

    /// Record summarize-stage output
    pub async fn record_summary(
        &self,
        id: TaskId,
        article_markdown: PathBuf,
        llm_meta: LlmMeta,
    ) -> Result<()> {
        self.mutate(id, |task| {
            task.artifacts.article_markdown.get_or_insert(article_markdown);
            task.llm_meta = Some(llm_meta);
        })
        .await
    }

    /// Record compose-stage output
    pub async fn record_composition(
        &self,
        id: TaskId,
        video: PathBuf,
        visuals_used: Vec<PathBuf>,
        tts_meta: TtsMeta,
    ) -> Result<()> {
        self.mutate(id, |task| {
            task.artifacts.video.get_or_insert(video);
            if task.artifacts.visuals_used.is_empty() {
                task.artifacts.visuals_used = visuals_used;
            }
            task.tts_meta = Some(tts_meta);
        })
        .await
    }

    /// Transition to `completed` at progress 100
    pub async fn complete(&self, id: TaskId) -> Result<()> {
        self.mutate(id, |task| {
            task.status = Status::Completed;
            task.progress = 100;
            task.message = COMPLETED_MESSAGE.to_string();
        })
        .await
    }

    /// Transition to `failed`, leaving progress and artifacts as they are
    pub async fn fail(&self, id: TaskId, error: &str) -> Result<()> {
        self.mutate(id, |task| {
            task.status = Status::Failed;
            task.message = format!("Error: {error}");
        })
        .await
    }

    async fn mutate<F>(&self, id: TaskId, f: F) -> Result<()>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or(Error::Task(TaskError::NotFound { id }))?;
        if task.status.is_terminal() {
            return Err(Error::Task(TaskError::AlreadyTerminal {
                id,
                status: task.status,
            }));
        }
        f(task);
        task.updated_at = Utc::now();
        Ok(())
    }
}

//! Task creation and background pipeline spawning.

use crate::error::{Error, Result};
use crate::registry::TaskRecord;
use crate::scraper::validate_url;
use crate::types::{Event, ProcessRequest, ProcessResponse, Status, TaskConfig, TaskId};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;

use super::TaskOrchestrator;

/// Message returned with a freshly accepted task
pub const STARTED_MESSAGE: &str = "Task started";

impl TaskOrchestrator {
    /// Accept a processing request
    ///
    /// Inserts a `pending` record, spawns the pipeline and returns at once.
    /// The returned id is queryable immediately.
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has begun
    /// - a fetch `InvalidUrl` error when the URL is not absolute http(s)
    pub async fn submit(&self, request: ProcessRequest) -> Result<ProcessResponse> {
        if !self.run_state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = request.url.trim().to_string();
        validate_url(&url)?;

        let config = TaskConfig::from_request(&request, self.config.pipeline.default_word_count);
        let id = TaskId::new();
        self.registry
            .insert(TaskRecord::new(id, url.clone(), config.clone()))
            .await?;

        tracing::info!(task_id = %id, url = %url, "task accepted");
        self.emit_event(Event::Queued {
            id,
            url: url.clone(),
        });

        self.spawn_pipeline(id, url, config).await;

        Ok(ProcessResponse {
            task_id: id,
            status: Status::Pending,
            message: STARTED_MESSAGE.to_string(),
        })
    }

    /// Spawn the pipeline for `id` and keep its handle until it finishes
    async fn spawn_pipeline(&self, id: TaskId, url: String, config: TaskConfig) {
        // Held across spawn so the task's own removal cannot run before the insert
        let mut handles = self.run_state.handles.lock().await;

        let orchestrator = self.clone();
        let handle = tokio::spawn(async move {
            match orchestrator
                .run_state
                .concurrent_limit
                .clone()
                .acquire_owned()
                .await
            {
                Ok(_permit) => {
                    let run = AssertUnwindSafe(orchestrator.run_pipeline(id, &url, &config));
                    if let Err(panic) = run.catch_unwind().await {
                        let error = Error::Other(format!(
                            "pipeline panicked: {}",
                            panic_message(panic.as_ref())
                        ));
                        orchestrator.finish_failed(id, &error).await;
                    }
                }
                Err(_) => {
                    tracing::warn!(task_id = %id, "concurrency limiter closed before pipeline start");
                    orchestrator.finish_failed(id, &Error::ShuttingDown).await;
                }
            }

            orchestrator.run_state.handles.lock().await.remove(&id);
        });

        handles.insert(id, handle);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

//! Graceful shutdown.

use crate::error::Result;
use crate::types::Event;
use std::time::Duration;

use super::TaskOrchestrator;

/// How long shutdown waits for in-flight pipelines
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

impl TaskOrchestrator {
    /// Gracefully shut down the orchestrator
    ///
    /// 1. Stops accepting submissions ([`submit`](Self::submit) returns
    ///    `ShuttingDown`)
    /// 2. Waits up to [`DRAIN_TIMEOUT`] for running pipelines to finish
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// Pipelines still running after the timeout are left to the runtime.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with_timeout(DRAIN_TIMEOUT).await
    }

    /// [`shutdown`](Self::shutdown) with an explicit drain timeout
    pub async fn shutdown_with_timeout(&self, drain_timeout: Duration) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.run_state
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        match tokio::time::timeout(drain_timeout, self.drain_pipelines()).await {
            Ok(drained) => {
                tracing::info!(drained, "All in-flight pipelines finished");
            }
            Err(_) => {
                tracing::warn!("Timeout waiting for pipelines to finish, proceeding with shutdown");
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Number of pipelines that have not finished
    pub async fn in_flight(&self) -> usize {
        self.run_state.handles.lock().await.len()
    }

    /// Await every tracked pipeline; returns how many were awaited
    async fn drain_pipelines(&self) -> usize {
        let mut drained = 0;
        loop {
            // Take the handles out so pipelines can deregister while we wait
            let pending: Vec<_> = {
                let mut handles = self.run_state.handles.lock().await;
                handles.drain().collect()
            };
            if pending.is_empty() {
                return drained;
            }

            tracing::debug!(active_count = pending.len(), "Waiting for pipelines to finish");
            for (id, handle) in pending {
                if let Err(e) = handle.await {
                    tracing::error!(task_id = %id, error = %e, "pipeline task panicked");
                }
                drained += 1;
            }
        }
    }
}

//! Waiting helpers for task lifecycle tests

use autoread::types::TaskStatusResponse;
use autoread::{Event, TaskId, TaskOrchestrator};
use std::time::Duration;

/// Result of waiting for a task to finish
#[derive(Debug)]
pub enum WaitResult {
    /// Task completed successfully
    Completed,
    /// Task failed with error
    Failed(String),
    /// Timeout waiting for completion
    Timeout,
    /// Channel closed unexpectedly
    ChannelClosed,
}

/// Wait for a `completed` or `failed` event for `id`
///
/// Subscribe before submitting, or the event may already have been sent.
pub async fn wait_for_completion(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    id: TaskId,
    timeout: Duration,
) -> WaitResult {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::Completed { id: event_id, .. }) if event_id == id => {
                    return WaitResult::Completed;
                }
                Ok(Event::Failed {
                    id: event_id,
                    error,
                }) if event_id == id => {
                    return WaitResult::Failed(error);
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => return WaitResult::ChannelClosed,
            }
        }
    })
    .await;

    result.unwrap_or(WaitResult::Timeout)
}

/// Poll status until terminal, returning every status read
pub async fn poll_until_terminal(
    orchestrator: &TaskOrchestrator,
    id: TaskId,
    timeout: Duration,
) -> Vec<TaskStatusResponse> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut history = Vec::new();
    loop {
        let status = orchestrator.status(id).await.expect("task should exist");
        let terminal = status.status.is_terminal();
        history.push(status);
        if terminal || tokio::time::Instant::now() >= deadline {
            return history;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Assert progress never decreased across reads
pub fn assert_progress_monotonic(history: &[TaskStatusResponse]) {
    for pair in history.windows(2) {
        assert!(
            pair[0].progress <= pair[1].progress,
            "progress went from {} to {}",
            pair[0].progress,
            pair[1].progress
        );
    }
}

//! Application state for the API server

use crate::{Config, TaskOrchestrator};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the orchestrator and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The task orchestrator (owns the registry and the media pipeline)
    pub orchestrator: Arc<TaskOrchestrator>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Arc<TaskOrchestrator>, config: Arc<Config>) -> Self {
        Self {
            orchestrator,
            config,
        }
    }
}

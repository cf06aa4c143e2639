//! Shared agent state handed to every HTTP handler.

use crate::config::AgentConfig;
use crate::metrics::HostMetrics;
use std::sync::Arc;

pub type SharedMetrics = Arc<HostMetrics>;

#[derive(Clone)]
pub struct AppState {
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            metrics: Arc::new(HostMetrics::new(config)),
        }
    }
}

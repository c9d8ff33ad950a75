//! API server state

use std::sync::Arc;

use crate::gateway::DocumentGateway;

/// API server state
#[derive(Clone)]
pub struct AppState {
    /// Shared by every request
    pub gateway: Arc<DocumentGateway>,
}

impl AppState {
    pub fn new(gateway: Arc<DocumentGateway>) -> Self {
        Self { gateway }
    }
}

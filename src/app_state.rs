use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{poller::JobPoller, providers::GenerationProvider, storage::BlobStore};

/// Shared application state passed to all route handlers.
///
/// Holds only read-only collaborators; no request writes into it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn BlobStore>,
    pub provider: Arc<dyn GenerationProvider>,
    pub poller: JobPoller,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn BlobStore>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        let poller = JobPoller::new(config.poll_config());
        Self {
            config: Arc::new(config),
            storage,
            provider,
            poller,
        }
    }
}

//! Generation provider adapters.
//!
//! Each adapter owns one third-party API shape (paths, auth scheme, field
//! names) and normalizes it into [`JobHandle`] and [`JobOutcome`]. Everything
//! upstream of this module only sees the [`GenerationProvider`] trait.

pub mod hedra;
pub mod http;
pub mod mock;
pub mod replicate;
pub mod runpod;
pub mod visionstory;

pub use hedra::HedraProvider;
pub use mock::MockProvider;
pub use replicate::ReplicateProvider;
pub use runpod::RunpodProvider;
pub use visionstory::VisionStoryProvider;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AppConfig, ProviderKind};
use crate::models::job::{GenerationRequest, JobHandle, JobOutcome};

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Stable identifier, also recorded in every [`JobHandle`].
    fn id(&self) -> &'static str;

    /// Whether the credentials this adapter needs are present.
    fn is_configured(&self) -> bool;

    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ProviderError>;

    /// One status check. Never returns [`JobOutcome::TimedOut`].
    async fn query_status(&self, handle: &JobHandle) -> Result<JobOutcome, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Status check failed: {0}")]
    StatusCheckFailed(String),
}

impl ProviderError {
    pub(crate) fn submission(err: impl std::fmt::Display) -> Self {
        ProviderError::SubmissionRejected(err.to_string())
    }

    pub(crate) fn status(err: impl std::fmt::Display) -> Self {
        ProviderError::StatusCheckFailed(err.to_string())
    }
}

/// Construct the adapter named by `config.generation_provider`.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn GenerationProvider>, reqwest::Error> {
    let provider: Arc<dyn GenerationProvider> = match config.generation_provider {
        ProviderKind::Hedra => Arc::new(HedraProvider::from_config(config)?),
        ProviderKind::Runpod => Arc::new(RunpodProvider::from_config(config)?),
        ProviderKind::Visionstory => Arc::new(VisionStoryProvider::from_config(config)?),
        ProviderKind::Replicate => Arc::new(ReplicateProvider::from_config(config)?),
    };

    tracing::info!(
        provider = provider.id(),
        configured = provider.is_configured(),
        "Generation provider selected"
    );
    Ok(provider)
}

/// Highest integer percentage (`N%`) anywhere in `text`, capped at 100.
///
/// Provider logs accumulate and may hold several progress bars in sequence.
pub(crate) fn max_percentage(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    text.match_indices('%')
        .filter_map(|(pos, _)| {
            let mut start = pos;
            while start > 0 && bytes[start - 1].is_ascii_digit() {
                start -= 1;
            }
            text[start..pos].parse::<u32>().ok()
        })
        .max()
        .map(|value| value.min(100) as u8)
}

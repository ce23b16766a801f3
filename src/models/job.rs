use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Target frame shape of the generated video.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
pub enum AspectRatio {
    #[default]
    #[strum(serialize = "16:9")]
    #[serde(rename = "16:9")]
    Landscape,
    #[strum(serialize = "9:16")]
    #[serde(rename = "9:16")]
    Portrait,
}

/// Normalized payload handed to every provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub image_url: String,
    pub audio_url: String,
    pub aspect_ratio: AspectRatio,
}

/// Reference to one provider-side job. Never mutated after submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub provider_id: String,
    pub external_job_id: String,
    pub submitted_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(provider_id: impl Into<String>, external_job_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            external_job_id: external_job_id.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Result of one status check, or of a whole poll run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Still running; carries a 0..=100 progress hint when the provider reports one.
    Pending(Option<u8>),
    Succeeded(String),
    Failed(String),
    TimedOut,
}

impl JobOutcome {
    /// Succeeded and Failed end a poll loop; TimedOut is produced by the loop itself.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_) | JobOutcome::Failed(_))
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            JobOutcome::Pending(progress) => *progress,
            JobOutcome::Succeeded(_) => Some(100),
            _ => None,
        }
    }

    /// Builds a terminal outcome from a provider's "done" response, which
    /// may or may not carry a usable URL.
    pub fn completed(video_url: Option<String>) -> Self {
        match video_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => JobOutcome::Succeeded(url),
            None => JobOutcome::Failed("provider reported completion without a video URL".into()),
        }
    }
}

/// Clamp a provider-reported progress figure into a percentage.
pub fn progress_hint(raw: Option<f64>) -> Option<u8> {
    raw.filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 100.0).round() as u8)
}

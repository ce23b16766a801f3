use axum::extract::{Path, State};
use axum::Json;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::api::{JobStatus, JobStatusResponse};
use crate::models::job::{JobHandle, JobOutcome};

/// GET /status/{job_id}: one status check against the configured provider.
///
/// Nothing is stored between calls, so repeated checks of the same job only
/// reflect what the provider reports.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::InvalidInput(format!("Invalid job id: {job_id}")));
    }
    if !state.provider.is_configured() {
        return Err(ApiError::Unconfigured(format!(
            "{} credentials are not configured",
            state.provider.id()
        )));
    }

    let handle = JobHandle::new(state.provider.id(), job_id);
    let outcome = state.provider.query_status(&handle).await?;

    tracing::debug!(
        job_id = %handle.external_job_id,
        outcome = ?outcome,
        "Status checked"
    );

    let progress = outcome.progress();
    let response = match outcome {
        JobOutcome::Succeeded(video_url) => JobStatusResponse {
            job_id: handle.external_job_id,
            status: JobStatus::Completed,
            video_url: Some(video_url),
            progress,
            error: None,
        },
        JobOutcome::Failed(reason) => JobStatusResponse {
            job_id: handle.external_job_id,
            status: JobStatus::Failed,
            video_url: None,
            progress: None,
            error: Some(reason),
        },
        JobOutcome::Pending(_) | JobOutcome::TimedOut => JobStatusResponse {
            job_id: handle.external_job_id,
            status: JobStatus::Pending,
            video_url: None,
            progress,
            error: None,
        },
    };

    Ok(Json(response))
}

/// Provider job ids are opaque but path-safe tokens.
fn is_valid_job_id(job_id: &str) -> bool {
    !job_id.is_empty()
        && job_id.len() <= 128
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !job_id.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_validation() {
        assert!(is_valid_job_id("hd_123"));
        assert!(is_valid_job_id("7f1c2a9e-1b2c-4d5e-8f90-1234567890ab"));
        assert!(!is_valid_job_id(""));
        assert!(!is_valid_job_id("../admin"));
        assert!(!is_valid_job_id("a?b=c"));
        assert!(!is_valid_job_id(&"x".repeat(129)));
    }
}

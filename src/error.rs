use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::services::poller::PollError;
use crate::services::providers::ProviderError;
use crate::services::storage::StorageError;

/// Everything a generation request can fail with, mapped onto HTTP.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    UploadFailed(#[source] StorageError),

    #[error("{0}")]
    SubmissionRejected(String),

    #[error("Status check failed: {0}")]
    StatusCheckFailed(String),

    #[error("Video generation failed: {0}")]
    GenerationFailed(String),

    #[error("Video generation did not finish within {0} seconds")]
    TimedOut(u64),

    #[error("{0}")]
    Unconfigured(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInput(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadFailed(cause) if cause.is_rejection() => StatusCode::BAD_REQUEST,
            ApiError::UploadFailed(_)
            | ApiError::SubmissionRejected(_)
            | ApiError::StatusCheckFailed(_)
            | ApiError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::TimedOut(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Unconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingInput(_) => "MISSING_INPUT",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::UploadFailed(cause) if cause.is_rejection() => "UPLOAD_REJECTED",
            ApiError::UploadFailed(_) => "STORAGE_UNAVAILABLE",
            ApiError::SubmissionRejected(_) => "SUBMISSION_REJECTED",
            ApiError::StatusCheckFailed(_) => "STATUS_CHECK_FAILED",
            ApiError::GenerationFailed(_) => "GENERATION_FAILED",
            ApiError::TimedOut(_) => "TIMED_OUT",
            ApiError::Unconfigured(_) => "UNCONFIGURED",
        }
    }

    /// Whether the same request may succeed if simply sent again.
    pub fn retryable(&self) -> bool {
        match self {
            ApiError::UploadFailed(cause) => !cause.is_rejection(),
            ApiError::TimedOut(_) | ApiError::StatusCheckFailed(_) => true,
            _ => false,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::UploadFailed(cause) => Some(cause.to_string()),
            ApiError::StatusCheckFailed(_) => {
                Some("The provider stopped answering status checks".to_string())
            }
            ApiError::TimedOut(_) => {
                Some("The job may still finish; query /status with the job id".to_string())
            }
            _ => None,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unconfigured(what) => {
                ApiError::Unconfigured(format!("{what} is not configured"))
            }
            ProviderError::SubmissionRejected(msg) => ApiError::SubmissionRejected(msg),
            ProviderError::StatusCheckFailed(msg) => ApiError::StatusCheckFailed(msg),
        }
    }
}

impl From<PollError> for ApiError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::StatusCheckFailed { source, .. } => ApiError::from(source),
            // Only reachable once the caller has gone away; nobody reads this.
            PollError::Cancelled => ApiError::StatusCheckFailed("polling cancelled".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Generation request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "Generation request rejected");
        }

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
            "retryable": self.retryable(),
        });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }

        metrics::counter!("generation_failed_total", "reason" => self.code()).increment(1);

        (status, axum::Json(body)).into_response()
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{Auth, ProviderHttp};
use super::{GenerationProvider, ProviderError};
use crate::config::AppConfig;
use crate::models::job::{GenerationRequest, JobHandle, JobOutcome};

/// Wav2Lip running on a RunPod serverless endpoint.
pub struct RunpodProvider {
    http: ProviderHttp,
    endpoint_id: Option<String>,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    input: Wav2LipInput<'a>,
}

#[derive(Serialize)]
struct Wav2LipInput<'a> {
    face: &'a str,
    audio: &'a str,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct RunAccepted {
    id: Option<String>,
}

#[derive(Deserialize)]
struct RunStatus {
    status: String,
    output: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
}

impl RunpodProvider {
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let auth = config.runpod_api_key.clone().map(Auth::Bearer);
        Ok(Self {
            http: ProviderHttp::new(&config.runpod_base_url, auth, config.request_timeout())?,
            endpoint_id: config.runpod_endpoint_id.clone(),
        })
    }

    fn endpoint(&self) -> Result<&str, ProviderError> {
        self.endpoint_id
            .as_deref()
            .ok_or(ProviderError::Unconfigured("RunPod endpoint id"))
    }
}

/// The worker returns either `{ "video_url": ... }` or a bare URL string.
fn output_url(output: Option<serde_json::Value>) -> Option<String> {
    match output? {
        serde_json::Value::String(url) => Some(url),
        serde_json::Value::Object(map) => map
            .get("video_url")
            .or_else(|| map.get("output_video"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn error_text(error: Option<serde_json::Value>, status: &str) -> String {
    match error {
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
        None => format!("job ended with status {status}"),
    }
}

#[async_trait]
impl GenerationProvider for RunpodProvider {
    fn id(&self) -> &'static str {
        "runpod"
    }

    fn is_configured(&self) -> bool {
        self.http.has_credentials() && self.endpoint_id.is_some()
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ProviderError> {
        if !self.http.has_credentials() {
            return Err(ProviderError::Unconfigured("RunPod API key"));
        }
        let endpoint = self.endpoint()?;

        let body = RunRequest {
            input: Wav2LipInput {
                face: &request.image_url,
                audio: &request.audio_url,
                aspect_ratio: request.aspect_ratio.to_string(),
            },
        };
        let accepted: RunAccepted = self
            .http
            .post_json(&format!("/v2/{}/run", endpoint), &body)
            .await
            .map_err(ProviderError::submission)?;

        let job_id = accepted
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::submission("no job id returned"))?;

        Ok(JobHandle::new(self.id(), job_id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobOutcome, ProviderError> {
        let endpoint = self.endpoint()?;
        let status: RunStatus = self
            .http
            .get_json(
                &format!("/v2/{}/status/{}", endpoint, handle.external_job_id),
                &[],
            )
            .await
            .map_err(ProviderError::status)?;

        Ok(match status.status.as_str() {
            "COMPLETED" => JobOutcome::completed(output_url(status.output)),
            "FAILED" | "CANCELLED" | "TIMED_OUT" => {
                JobOutcome::Failed(error_text(status.error, &status.status))
            }
            // IN_QUEUE / IN_PROGRESS carry no progress figure
            _ => JobOutcome::Pending(None),
        })
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{Auth, ProviderHttp};
use super::{max_percentage, GenerationProvider, ProviderError};
use crate::config::AppConfig;
use crate::models::job::{GenerationRequest, JobHandle, JobOutcome};

/// Wav2Lip-style model hosted on Replicate predictions.
pub struct ReplicateProvider {
    http: ProviderHttp,
    model_version: String,
}

#[derive(Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Serialize)]
struct PredictionInput<'a> {
    face: &'a str,
    audio: &'a str,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct Prediction {
    id: Option<String>,
    status: Option<String>,
    output: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
    logs: Option<String>,
}

impl ReplicateProvider {
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let auth = config.replicate_api_token.clone().map(Auth::Token);
        Ok(Self {
            http: ProviderHttp::new(&config.replicate_base_url, auth, config.request_timeout())?,
            model_version: config.replicate_model_version.clone(),
        })
    }
}

/// Output is either a URL or a list of URLs; the first is the video.
fn output_url(output: Option<serde_json::Value>) -> Option<String> {
    match output? {
        serde_json::Value::String(url) => Some(url),
        serde_json::Value::Array(items) => items
            .into_iter()
            .find_map(|item| item.as_str().map(str::to_string)),
        _ => None,
    }
}

#[async_trait]
impl GenerationProvider for ReplicateProvider {
    fn id(&self) -> &'static str {
        "replicate"
    }

    fn is_configured(&self) -> bool {
        self.http.has_credentials()
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::Unconfigured("Replicate API token"));
        }

        let body = PredictionRequest {
            version: &self.model_version,
            input: PredictionInput {
                face: &request.image_url,
                audio: &request.audio_url,
                aspect_ratio: request.aspect_ratio.to_string(),
            },
        };
        let prediction: Prediction = self
            .http
            .post_json("/v1/predictions", &body)
            .await
            .map_err(ProviderError::submission)?;

        let id = prediction
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::submission("no prediction id returned"))?;

        Ok(JobHandle::new(self.id(), id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobOutcome, ProviderError> {
        let prediction: Prediction = self
            .http
            .get_json(&format!("/v1/predictions/{}", handle.external_job_id), &[])
            .await
            .map_err(ProviderError::status)?;

        Ok(match prediction.status.as_deref() {
            Some("succeeded") => JobOutcome::completed(output_url(prediction.output)),
            Some("failed") | Some("canceled") => JobOutcome::Failed(match prediction.error {
                Some(serde_json::Value::String(text)) => text,
                Some(serde_json::Value::Null) | None => "prediction did not succeed".to_string(),
                Some(other) => other.to_string(),
            }),
            _ => JobOutcome::Pending(prediction.logs.as_deref().and_then(max_percentage)),
        })
    }
}

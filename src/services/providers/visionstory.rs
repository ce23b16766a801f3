use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{Auth, ProviderHttp};
use super::{GenerationProvider, ProviderError};
use crate::config::AppConfig;
use crate::models::job::{progress_hint, GenerationRequest, JobHandle, JobOutcome};

pub struct VisionStoryProvider {
    http: ProviderHttp,
}

#[derive(Serialize)]
struct VideoRequest<'a> {
    image_url: &'a str,
    audio_url: &'a str,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct VideoCreated {
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct VideoStatus {
    status: Option<String>,
    video_url: Option<String>,
    progress: Option<f64>,
    error_message: Option<String>,
}

impl VisionStoryProvider {
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let auth = config
            .visionstory_api_key
            .clone()
            .map(|key| Auth::Header("X-API-Key", key));
        Ok(Self {
            http: ProviderHttp::new(&config.visionstory_base_url, auth, config.request_timeout())?,
        })
    }
}

#[async_trait]
impl GenerationProvider for VisionStoryProvider {
    fn id(&self) -> &'static str {
        "visionstory"
    }

    fn is_configured(&self) -> bool {
        self.http.has_credentials()
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::Unconfigured("VisionStory API key"));
        }

        let body = VideoRequest {
            image_url: &request.image_url,
            audio_url: &request.audio_url,
            aspect_ratio: request.aspect_ratio.to_string(),
        };
        let created: Envelope<VideoCreated> = self
            .http
            .post_json("/api/v1/video", &body)
            .await
            .map_err(ProviderError::submission)?;

        let video_id = created
            .data
            .and_then(|data| data.video_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::submission("no video_id returned"))?;

        Ok(JobHandle::new(self.id(), video_id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobOutcome, ProviderError> {
        let envelope: Envelope<VideoStatus> = self
            .http
            .get_json("/api/v1/video", &[("video_id", handle.external_job_id.as_str())])
            .await
            .map_err(ProviderError::status)?;

        let status = envelope
            .data
            .ok_or_else(|| ProviderError::status("response carried no data"))?;

        Ok(match status.status.as_deref() {
            Some("succeeded") | Some("completed") => JobOutcome::completed(status.video_url),
            Some("failed") => JobOutcome::Failed(
                status
                    .error_message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            _ => JobOutcome::Pending(progress_hint(status.progress)),
        })
    }
}

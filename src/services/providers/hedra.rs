use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{Auth, ProviderHttp};
use super::{GenerationProvider, ProviderError};
use crate::config::AppConfig;
use crate::models::job::{progress_hint, AspectRatio, GenerationRequest, JobHandle, JobOutcome};

/// Hedra Character-2 portrait animation.
pub struct HedraProvider {
    http: ProviderHttp,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PortraitRequest<'a> {
    audio_source: &'a str,
    image_source: &'a str,
    aspect_ratio: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortraitAccepted {
    job_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortraitStatus {
    status: Option<String>,
    video_url: Option<String>,
    result_url: Option<String>,
    error: Option<String>,
    progress: Option<f64>,
}

impl HedraProvider {
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let auth = config.hedra_api_key.clone().map(Auth::Bearer);
        Ok(Self {
            http: ProviderHttp::new(&config.hedra_base_url, auth, config.request_timeout())?,
        })
    }
}

/// Hedra names orientations instead of ratios.
fn orientation(aspect_ratio: AspectRatio) -> &'static str {
    match aspect_ratio {
        AspectRatio::Portrait => "vertical",
        AspectRatio::Landscape => "horizontal",
    }
}

#[async_trait]
impl GenerationProvider for HedraProvider {
    fn id(&self) -> &'static str {
        "hedra"
    }

    fn is_configured(&self) -> bool {
        self.http.has_credentials()
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::Unconfigured("Hedra API key"));
        }

        let body = PortraitRequest {
            audio_source: &request.audio_url,
            image_source: &request.image_url,
            aspect_ratio: orientation(request.aspect_ratio),
        };
        let accepted: PortraitAccepted = self
            .http
            .post_json("/api/v1/portrait", &body)
            .await
            .map_err(ProviderError::submission)?;

        let job_id = accepted
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::submission("no jobId returned"))?;

        Ok(JobHandle::new(self.id(), job_id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobOutcome, ProviderError> {
        let path = format!("/api/v1/portrait/{}", handle.external_job_id);
        let status: PortraitStatus = self
            .http
            .get_json(&path, &[])
            .await
            .map_err(ProviderError::status)?;

        Ok(match status.status.as_deref() {
            Some("completed") | Some("success") => {
                JobOutcome::completed(status.video_url.or(status.result_url))
            }
            Some("failed") | Some("error") => {
                JobOutcome::Failed(status.error.unwrap_or_else(|| "Unknown error".to_string()))
            }
            _ => JobOutcome::Pending(progress_hint(status.progress)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> HedraProvider {
        let config = AppConfig {
            hedra_api_key: Some("hd-key".into()),
            hedra_base_url: server.uri(),
            ..AppConfig::default()
        };
        HedraProvider::from_config(&config).unwrap()
    }

    fn request(aspect_ratio: AspectRatio) -> GenerationRequest {
        GenerationRequest {
            image_url: "https://cdn.example.com/face.png".into(),
            audio_url: "https://cdn.example.com/voice.mp3".into(),
            aspect_ratio,
        }
    }

    #[tokio::test]
    async fn submit_maps_portrait_to_vertical() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/portrait"))
            .and(header("authorization", "Bearer hd-key"))
            .and(body_json(serde_json::json!({
                "audioSource": "https://cdn.example.com/voice.mp3",
                "imageSource": "https://cdn.example.com/face.png",
                "aspectRatio": "vertical"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jobId": "hd_123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = provider(&server)
            .submit(&request(AspectRatio::Portrait))
            .await
            .unwrap();

        assert_eq!(handle.provider_id, "hedra");
        assert_eq!(handle.external_job_id, "hd_123");
    }

    #[tokio::test]
    async fn submit_without_job_id_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/portrait"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = provider(&server)
            .submit(&request(AspectRatio::Landscape))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::SubmissionRejected(_)));
    }

    #[tokio::test]
    async fn status_normalizes_each_state() {
        let server = MockServer::start().await;
        let cases = [
            ("running", serde_json::json!({ "status": "processing", "progress": 35 })),
            ("done", serde_json::json!({ "status": "completed", "resultUrl": "https://hedra.example.com/v.mp4" })),
            ("broken", serde_json::json!({ "status": "error", "error": "face not detected" })),
        ];
        for (id, body) in &cases {
            Mock::given(method("GET"))
                .and(path(format!("/api/v1/portrait/{}", id)))
                .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
                .mount(&server)
                .await;
        }
        let provider = provider(&server);

        let pending = provider.query_status(&JobHandle::new("hedra", "running")).await.unwrap();
        assert_eq!(pending, JobOutcome::Pending(Some(35)));

        let done = provider.query_status(&JobHandle::new("hedra", "done")).await.unwrap();
        assert_eq!(done, JobOutcome::Succeeded("https://hedra.example.com/v.mp4".into()));

        let failed = provider.query_status(&JobHandle::new("hedra", "broken")).await.unwrap();
        assert_eq!(failed, JobOutcome::Failed("face not detected".into()));
    }

    #[tokio::test]
    async fn status_http_error_is_a_failed_check() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/portrait/job"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .query_status(&JobHandle::new("hedra", "job"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::StatusCheckFailed(_)));
    }

    #[tokio::test]
    async fn submit_without_key_is_unconfigured() {
        let provider = HedraProvider::from_config(&AppConfig::default()).unwrap();
        let err = provider.submit(&request(AspectRatio::Landscape)).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unconfigured(_)));
    }
}

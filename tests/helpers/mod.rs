//! Test helper utilities: an in-process server wired to mock collaborators

use reqwest::multipart;
use serde::Deserialize;
use std::sync::Arc;

use lipsync_gateway::app_state::AppState;
use lipsync_gateway::config::{AppConfig, ResponseMode};
use lipsync_gateway::routes;
use lipsync_gateway::services::providers::MockProvider;
use lipsync_gateway::services::storage::MockBlobStore;

use crate::fixtures::MediaFixture;

/// A running server plus handles on its mocks.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub storage: MockBlobStore,
    pub provider: MockProvider,
}

/// Error body shared by every failing endpoint
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub retryable: bool,
    pub details: Option<String>,
}

/// Configuration with no waiting between polls.
pub fn test_config(mode: ResponseMode) -> AppConfig {
    AppConfig {
        response_mode: mode,
        poll_interval_secs: 0,
        poll_max_attempts: 5,
        poll_max_consecutive_failures: 3,
        request_timeout_secs: 5,
        ..AppConfig::default()
    }
}

pub async fn spawn_app(storage: MockBlobStore, provider: MockProvider) -> TestApp {
    spawn_app_with(test_config(ResponseMode::Sync), storage, provider).await
}

pub async fn spawn_app_with(
    config: AppConfig,
    storage: MockBlobStore,
    provider: MockProvider,
) -> TestApp {
    let state = AppState::new(
        config,
        Arc::new(storage.clone()),
        Arc::new(provider.clone()),
    );
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        storage,
        provider,
    }
}

fn part(fixture: &MediaFixture) -> multipart::Part {
    multipart::Part::bytes(fixture.bytes())
        .file_name(fixture.filename.to_string())
        .mime_str(fixture.mime_type)
        .unwrap()
}

/// Multipart body with any subset of image, audio and aspect ratio.
pub fn generation_form(
    image: Option<&MediaFixture>,
    audio: Option<&MediaFixture>,
    aspect_ratio: Option<&str>,
) -> multipart::Form {
    let mut form = multipart::Form::new();
    if let Some(image) = image {
        form = form.part("image", part(image));
    }
    if let Some(audio) = audio {
        form = form.part("audio", part(audio));
    }
    if let Some(aspect_ratio) = aspect_ratio {
        form = form.text("aspectRatio", aspect_ratio.to_string());
    }
    form
}

impl TestApp {
    pub async fn post_generate(&self, form: multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/generate", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Generate request failed")
    }

    pub async fn post_upload(&self, path: &str, form: multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/upload/{}", self.base_url, path))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    pub async fn get_status(&self, job_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/status/{}", self.base_url, job_id))
            .send()
            .await
            .expect("Status request failed")
    }
}

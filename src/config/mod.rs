use serde::Deserialize;
use std::time::Duration;

use crate::services::poller::PollConfig;

/// Which generation backend serves `/generate` and `/status`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Hedra,
    Runpod,
    Visionstory,
    Replicate,
}

/// Whether `/generate` holds the request open until the job finishes or
/// hands back the job id for the caller to poll `/status`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Sync,
    Async,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Sync => "sync",
            ResponseMode::Async => "async",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:10000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub response_mode: ResponseMode,

    #[serde(default)]
    pub generation_provider: ProviderKind,

    /// S3-compatible bucket receiving uploaded portraits and audio
    pub storage_bucket: Option<String>,

    /// S3-compatible endpoint URL
    pub storage_endpoint: Option<String>,

    #[serde(default = "default_storage_region")]
    pub storage_region: String,

    pub storage_access_key: Option<String>,

    pub storage_secret_key: Option<String>,

    /// Public URL prefix objects are served from (CDN or public bucket domain)
    pub storage_public_base_url: Option<String>,

    /// Root folder for uploaded objects
    #[serde(default = "default_storage_folder")]
    pub storage_folder: String,

    pub hedra_api_key: Option<String>,

    #[serde(default = "default_hedra_base_url")]
    pub hedra_base_url: String,

    pub runpod_api_key: Option<String>,

    /// Serverless endpoint running the Wav2Lip worker
    pub runpod_endpoint_id: Option<String>,

    #[serde(default = "default_runpod_base_url")]
    pub runpod_base_url: String,

    pub visionstory_api_key: Option<String>,

    #[serde(default = "default_visionstory_base_url")]
    pub visionstory_base_url: String,

    pub replicate_api_token: Option<String>,

    #[serde(default = "default_replicate_model_version")]
    pub replicate_model_version: String,

    #[serde(default = "default_replicate_base_url")]
    pub replicate_base_url: String,

    /// Fixed delay between status checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    #[serde(default = "default_poll_max_consecutive_failures")]
    pub poll_max_consecutive_failures: u32,

    /// Ceiling for any single outbound HTTP call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Per-file upload ceiling in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:10000".to_string()
}

fn default_storage_region() -> String {
    "auto".to_string()
}

fn default_storage_folder() -> String {
    "talkflair".to_string()
}

fn default_hedra_base_url() -> String {
    "https://www.hedra.com".to_string()
}

fn default_runpod_base_url() -> String {
    "https://api.runpod.ai".to_string()
}

fn default_visionstory_base_url() -> String {
    "https://openapi.visionstory.ai".to_string()
}

fn default_replicate_model_version() -> String {
    "8d65e3f4f4298520e079198b493c25adfc43c058ffec924f2aefc8010ed25eef".to_string()
}

fn default_replicate_base_url() -> String {
    "https://api.replicate.com".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_poll_max_attempts() -> u32 {
    30
}

fn default_poll_max_consecutive_failures() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.poll_max_attempts,
            max_consecutive_failures: self.poll_max_consecutive_failures,
            call_timeout: self.request_timeout(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            response_mode: ResponseMode::default(),
            generation_provider: ProviderKind::default(),
            storage_bucket: None,
            storage_endpoint: None,
            storage_region: default_storage_region(),
            storage_access_key: None,
            storage_secret_key: None,
            storage_public_base_url: None,
            storage_folder: default_storage_folder(),
            hedra_api_key: None,
            hedra_base_url: default_hedra_base_url(),
            runpod_api_key: None,
            runpod_endpoint_id: None,
            runpod_base_url: default_runpod_base_url(),
            visionstory_api_key: None,
            visionstory_base_url: default_visionstory_base_url(),
            replicate_api_token: None,
            replicate_model_version: default_replicate_model_version(),
            replicate_base_url: default_replicate_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_max_attempts: default_poll_max_attempts(),
            poll_max_consecutive_failures: default_poll_max_consecutive_failures(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

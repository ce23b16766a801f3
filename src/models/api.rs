use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::asset::UploadedAsset;

/// JSON body for `POST /generate` when the media is already hosted.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFromUrlsRequest {
    #[garde(url, length(max = 2048))]
    pub image_url: String,

    #[garde(url, length(max = 2048))]
    pub audio_url: String,

    #[garde(skip)]
    pub aspect_ratio: Option<String>,
}

/// Synchronous-mode success body: the finished video.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub video_url: String,
    pub job_id: String,
    pub provider: String,
    pub image_url: String,
    pub audio_url: String,
}

/// Asynchronous-mode body: the job was accepted, poll `status_url`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAcceptedResponse {
    pub success: bool,
    pub job_id: String,
    pub provider: String,
    pub status: JobStatus,
    pub status_url: String,
    pub image_url: String,
    pub audio_url: String,
}

/// Externally visible job state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

/// Response for `GET /status/{job_id}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A file stored by one of the `/upload/*` endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub url: String,
    pub storage_id: String,
    pub filename: String,
    pub size_bytes: usize,
    pub mime_type: String,
}

impl StoredFile {
    pub fn new(asset: UploadedAsset, filename: String) -> Self {
        Self {
            url: asset.remote_url,
            storage_id: asset.storage_id,
            filename,
            size_bytes: asset.size_bytes,
            mime_type: asset.mime_type,
        }
    }
}

/// Files stored by `POST /upload/multiple`; absent parts are omitted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoredFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<StoredFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<StoredFile>,
}

/// Envelope shared by the upload endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

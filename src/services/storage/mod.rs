//! Object storage for uploaded portraits and audio clips.
//!
//! Every upload is a single attempt; the caller decides what a failure means
//! for the request as a whole.

pub mod bucket;
pub mod mock;

pub use bucket::S3BlobStore;
pub use mock::{MockBlobStore, MockUploadFailure};

use async_trait::async_trait;

use crate::models::asset::{IncomingFile, UploadedAsset};

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Whether credentials are present; reported by `/health`.
    fn is_configured(&self) -> bool;

    /// Store `file` under `folder_hint` and return its public location.
    async fn upload(
        &self,
        file: &IncomingFile,
        folder_hint: &str,
    ) -> Result<UploadedAsset, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Rejections are about the payload; everything else is about the store.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StorageError::Rejected(_))
    }
}

/// Object key for an upload: `{folder}/{uuid}-{file name}` with the file
/// name reduced to URL-safe characters.
pub fn object_key(folder: &str, file_name: &str) -> String {
    let mut safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    safe.truncate(80);
    if safe.trim_matches(|c| c == '.' || c == '_').is_empty() {
        safe = "upload".to_string();
    }

    format!(
        "{}/{}-{}",
        folder.trim_matches('/'),
        uuid::Uuid::new_v4(),
        safe
    )
}

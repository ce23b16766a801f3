use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::{object_key, BlobStore, StorageError};
use crate::config::AppConfig;
use crate::models::asset::{IncomingFile, UploadedAsset};

/// Client for S3-compatible object storage (R2, Spaces, MinIO, S3).
pub struct S3BlobStore {
    bucket: Option<Box<Bucket>>,
    public_base_url: Option<String>,
}

impl S3BlobStore {
    pub fn new(
        bucket_name: &str,
        region_name: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        public_base_url: Option<String>,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: region_name.to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket: Some(bucket),
            public_base_url: public_base_url.map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// A store with no credentials; every upload fails as unavailable.
    pub fn unconfigured() -> Self {
        Self {
            bucket: None,
            public_base_url: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let (Some(bucket), Some(endpoint), Some(access_key), Some(secret_key)) = (
            config.storage_bucket.as_deref(),
            config.storage_endpoint.as_deref(),
            config.storage_access_key.as_deref(),
            config.storage_secret_key.as_deref(),
        ) else {
            tracing::warn!("Object storage credentials not configured; uploads will fail");
            return Ok(Self::unconfigured());
        };

        let mut store = Self::new(
            bucket,
            &config.storage_region,
            endpoint,
            access_key,
            secret_key,
            config.storage_public_base_url.clone(),
        )?;
        if let Some(bucket) = store.bucket.as_mut() {
            bucket.set_request_timeout(Some(config.request_timeout()));
        }
        Ok(store)
    }

    fn public_url(&self, bucket: &Bucket, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("{}/{}", bucket.url(), key),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn is_configured(&self) -> bool {
        self.bucket.is_some()
    }

    async fn upload(
        &self,
        file: &IncomingFile,
        folder_hint: &str,
    ) -> Result<UploadedAsset, StorageError> {
        let bucket = self.bucket.as_ref().ok_or_else(|| {
            StorageError::Unavailable("object storage credentials are not configured".into())
        })?;

        let key = object_key(folder_hint, &file.file_name);
        let response = bucket
            .put_object_with_content_type(&key, &file.bytes, &file.mime_type)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            let body = String::from_utf8_lossy(response.as_slice()).into_owned();
            tracing::error!(key = %key, status, body = %body, "Object store refused upload");
            return Err(classify_status(status, body));
        }

        tracing::info!(
            key = %key,
            kind = ?file.kind,
            size_bytes = file.bytes.len(),
            "Uploaded object"
        );

        Ok(UploadedAsset {
            kind: file.kind,
            remote_url: self.public_url(bucket, &key),
            storage_id: key,
            size_bytes: file.bytes.len(),
            mime_type: file.mime_type.clone(),
        })
    }
}

/// Payload problems are rejections; credential and server problems mean the
/// store is unavailable.
fn classify_status(status: u16, body: String) -> StorageError {
    match status {
        400 | 411 | 413 | 415 => StorageError::Rejected(format!("status {status}: {body}")),
        _ => StorageError::Unavailable(format!("status {status}: {body}")),
    }
}

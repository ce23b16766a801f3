use super::{object_key, BlobStore, StorageError};
use crate::models::asset::{AssetKind, IncomingFile, UploadedAsset};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How a scripted upload should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockUploadFailure {
    Unavailable,
    Rejected,
}

/// In-memory object store with call counters, for tests.
#[derive(Clone)]
pub struct MockBlobStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failures: Arc<Mutex<HashMap<AssetKind, MockUploadFailure>>>,
    base_url: String,
    configured: bool,
    upload_count: Arc<Mutex<usize>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            configured: true,
            upload_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn failing(self, kind: AssetKind, failure: MockUploadFailure) -> Self {
        self.failures.lock().unwrap().insert(kind, failure);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_objects(&self) -> HashMap<String, Vec<u8>> {
        self.objects.lock().unwrap().clone()
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn upload(
        &self,
        file: &IncomingFile,
        folder_hint: &str,
    ) -> Result<UploadedAsset, StorageError> {
        *self.upload_count.lock().unwrap() += 1;

        if !self.configured {
            return Err(StorageError::Unavailable("mock store unconfigured".into()));
        }
        match self.failures.lock().unwrap().get(&file.kind) {
            Some(MockUploadFailure::Unavailable) => {
                return Err(StorageError::Unavailable("mock store offline".into()))
            }
            Some(MockUploadFailure::Rejected) => {
                return Err(StorageError::Rejected("mock store refused payload".into()))
            }
            None => {}
        }

        let key = object_key(folder_hint, &file.file_name);
        self.objects
            .lock()
            .unwrap()
            .insert(key.clone(), file.bytes.clone());

        Ok(UploadedAsset {
            kind: file.kind,
            remote_url: format!("{}/{}", self.base_url, key),
            storage_id: key,
            size_bytes: file.bytes.len(),
            mime_type: file.mime_type.clone(),
        })
    }
}

use serde::Serialize;

/// Which half of a generation request a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Audio,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
        }
    }

    /// Sub-folder the object store files this kind under.
    pub fn folder(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Audio => "audio",
        }
    }

    /// Whether a media type is acceptable for this kind.
    pub fn accepts(&self, mime_type: &str) -> bool {
        match self {
            AssetKind::Image => mime_type.starts_with("image/"),
            AssetKind::Audio => mime_type.starts_with("audio/"),
        }
    }
}

/// A file accepted by the request handler, before upload.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub kind: AssetKind,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// A file that now lives in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedAsset {
    pub kind: AssetKind,
    pub remote_url: String,
    pub storage_id: String,
    pub size_bytes: usize,
    pub mime_type: String,
}

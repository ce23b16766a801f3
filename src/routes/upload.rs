use axum::extract::{Request, State};
use axum::Json;

use super::generate::{read_media_fields, store_file};
use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::api::{StoredFile, StoredFiles, UploadResponse};
use crate::models::asset::{AssetKind, IncomingFile};

/// POST /upload/image: store a portrait without generating anything.
pub async fn upload_image(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<UploadResponse<StoredFile>>> {
    upload_single(&state, request, AssetKind::Image).await
}

/// POST /upload/audio: store a voice clip without generating anything.
pub async fn upload_audio(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<UploadResponse<StoredFile>>> {
    upload_single(&state, request, AssetKind::Audio).await
}

/// POST /upload/multiple: store an image, an audio clip, or both.
pub async fn upload_multiple(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<UploadResponse<StoredFiles>>> {
    let fields = read_media_fields(&state, request).await?;
    if fields.image.is_none() && fields.audio.is_none() {
        return Err(ApiError::MissingInput(
            "At least one image or audio file is required".to_string(),
        ));
    }

    let (image, audio) = tokio::join!(
        store_optional(&state, fields.image),
        store_optional(&state, fields.audio)
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "Files uploaded successfully".to_string(),
        data: StoredFiles {
            image: image?,
            audio: audio?,
        },
    }))
}

async fn upload_single(
    state: &AppState,
    request: Request,
    kind: AssetKind,
) -> ApiResult<Json<UploadResponse<StoredFile>>> {
    let fields = read_media_fields(state, request).await?;
    let file = match kind {
        AssetKind::Image => fields.image,
        AssetKind::Audio => fields.audio,
    }
    .ok_or_else(|| ApiError::MissingInput(format!("No {} file provided", kind.as_str())))?;

    let stored = store(state, file).await?;
    Ok(Json(UploadResponse {
        success: true,
        message: match kind {
            AssetKind::Image => "Image uploaded successfully",
            AssetKind::Audio => "Audio uploaded successfully",
        }
        .to_string(),
        data: stored,
    }))
}

async fn store_optional(state: &AppState, file: Option<IncomingFile>) -> ApiResult<Option<StoredFile>> {
    match file {
        Some(file) => store(state, file).await.map(Some),
        None => Ok(None),
    }
}

async fn store(state: &AppState, file: IncomingFile) -> ApiResult<StoredFile> {
    let asset = store_file(state, &file).await?;
    tracing::info!(
        kind = file.kind.as_str(),
        storage_id = %asset.storage_id,
        size_bytes = asset.size_bytes,
        "File stored"
    );
    Ok(StoredFile::new(asset, file.file_name))
}

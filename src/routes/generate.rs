use std::str::FromStr;
use std::time::Instant;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use garde::Validate;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::config::ResponseMode;
use crate::error::{ApiError, ApiResult};
use crate::models::api::{GenerateFromUrlsRequest, GenerateResponse, JobAcceptedResponse, JobStatus};
use crate::models::asset::{AssetKind, IncomingFile, UploadedAsset};
use crate::models::job::{AspectRatio, GenerationRequest, JobHandle, JobOutcome};
use crate::services::storage::StorageError;

/// Where the two media inputs come from.
enum Media {
    Files { image: IncomingFile, audio: IncomingFile },
    Urls { image_url: String, audio_url: String },
}

struct GenerateInput {
    media: Media,
    aspect_ratio: AspectRatio,
}

/// POST /generate: upload a portrait and a voice clip, then render a
/// lip-synced video with the configured provider.
pub async fn generate(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    metrics::counter!("generation_requests_total").increment(1);

    let input = read_input(&state, request).await?;

    if !state.provider.is_configured() {
        return Err(ApiError::Unconfigured(format!(
            "{} credentials are not configured",
            state.provider.id()
        )));
    }

    let (image_url, audio_url) = match input.media {
        Media::Files { image, audio } => upload_pair(&state, &image, &audio).await?,
        Media::Urls {
            image_url,
            audio_url,
        } => (image_url, audio_url),
    };

    let generation = GenerationRequest {
        image_url,
        audio_url,
        aspect_ratio: input.aspect_ratio,
    };
    let handle = state.provider.submit(&generation).await?;

    tracing::info!(
        job_id = %handle.external_job_id,
        provider = %handle.provider_id,
        aspect_ratio = %generation.aspect_ratio,
        mode = state.config.response_mode.as_str(),
        "Generation job submitted"
    );

    match state.config.response_mode {
        ResponseMode::Async => {
            let body = JobAcceptedResponse {
                success: true,
                status_url: format!("/status/{}", handle.external_job_id),
                job_id: handle.external_job_id,
                provider: handle.provider_id,
                status: JobStatus::Pending,
                image_url: generation.image_url,
                audio_url: generation.audio_url,
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        ResponseMode::Sync => {
            let outcome = wait_for_outcome(&state, &handle).await?;
            let video_url = finished_video_url(&state, outcome, &generation)?;

            metrics::counter!("generation_completed_total").increment(1);
            tracing::info!(
                job_id = %handle.external_job_id,
                video_url = %video_url,
                "Lip-sync video generated"
            );

            let body = GenerateResponse {
                success: true,
                video_url,
                job_id: handle.external_job_id,
                provider: handle.provider_id,
                image_url: generation.image_url,
                audio_url: generation.audio_url,
            };
            Ok(Json(body).into_response())
        }
    }
}

/// Run the poll loop on its own task. If the client disconnects this
/// handler is dropped, the guard cancels the token, and the loop stops at
/// its next iteration boundary.
async fn wait_for_outcome(state: &AppState, handle: &JobHandle) -> ApiResult<JobOutcome> {
    let cancel = CancellationToken::new();
    let _disconnect_guard = cancel.clone().drop_guard();

    let poller = state.poller.clone();
    let provider = state.provider.clone();
    let handle = handle.clone();
    let task = tokio::spawn(async move { poller.poll(provider.as_ref(), &handle, &cancel).await });

    let outcome = task
        .await
        .map_err(|e| ApiError::StatusCheckFailed(format!("poll task aborted: {e}")))??;
    Ok(outcome)
}

fn finished_video_url(
    state: &AppState,
    outcome: JobOutcome,
    generation: &GenerationRequest,
) -> ApiResult<String> {
    match outcome {
        JobOutcome::Succeeded(url) => {
            let well_formed = reqwest::Url::parse(&url)
                .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !well_formed || url == generation.image_url || url == generation.audio_url {
                return Err(ApiError::GenerationFailed(format!(
                    "provider returned an unusable video URL: {url}"
                )));
            }
            Ok(url)
        }
        JobOutcome::Failed(reason) => Err(ApiError::GenerationFailed(reason)),
        JobOutcome::TimedOut | JobOutcome::Pending(_) => {
            let poll = state.poller.config();
            Err(ApiError::TimedOut(
                poll.interval.as_secs() * u64::from(poll.max_attempts),
            ))
        }
    }
}

/// Upload both files concurrently and wait for both; either failure fails
/// the request.
async fn upload_pair(
    state: &AppState,
    image: &IncomingFile,
    audio: &IncomingFile,
) -> ApiResult<(String, String)> {
    let started = Instant::now();
    let (image_result, audio_result) =
        tokio::join!(store_file(state, image), store_file(state, audio));
    metrics::histogram!("generation_upload_seconds").record(started.elapsed().as_secs_f64());

    let image_asset = image_result?;
    let audio_asset = audio_result?;

    tracing::info!(
        image_url = %image_asset.remote_url,
        audio_url = %audio_asset.remote_url,
        image_bytes = image_asset.size_bytes,
        audio_bytes = audio_asset.size_bytes,
        "Media uploaded"
    );

    Ok((image_asset.remote_url, audio_asset.remote_url))
}

/// Store one file under `{storage folder}/{images|audio}`.
pub(super) async fn store_file(state: &AppState, file: &IncomingFile) -> ApiResult<UploadedAsset> {
    let folder = format!(
        "{}/{}",
        state.config.storage_folder.trim_matches('/'),
        file.kind.folder()
    );
    state
        .storage
        .upload(file, &folder)
        .await
        .map_err(ApiError::UploadFailed)
}

async fn read_input(state: &AppState, request: Request) -> ApiResult<GenerateInput> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let fields = read_media_fields(state, request).await?;
        let (Some(image), Some(audio)) = (fields.image, fields.audio) else {
            return Err(ApiError::MissingInput(
                "Both image and audio files are required".to_string(),
            ));
        };

        Ok(GenerateInput {
            media: Media::Files { image, audio },
            aspect_ratio: parse_aspect_ratio(fields.aspect_ratio.as_deref())?,
        })
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<GenerateFromUrlsRequest>::from_request(request, state)
            .await
            .map_err(|e| ApiError::InvalidInput(e.body_text()))?;
        body.validate()
            .map_err(|report| ApiError::InvalidInput(report.to_string()))?;

        Ok(GenerateInput {
            aspect_ratio: parse_aspect_ratio(body.aspect_ratio.as_deref())?,
            media: Media::Urls {
                image_url: body.image_url,
                audio_url: body.audio_url,
            },
        })
    } else {
        Err(ApiError::MissingInput(
            "Both image and audio are required (multipart files or JSON imageUrl/audioUrl)"
                .to_string(),
        ))
    }
}

/// Files and form fields of a multipart request.
pub(super) struct MediaFields {
    pub image: Option<IncomingFile>,
    pub audio: Option<IncomingFile>,
    pub aspect_ratio: Option<String>,
}

/// Read at most one `image` and one `audio` part, checking size and media
/// type. Empty parts count as absent; anything that is not multipart is
/// missing input.
pub(super) async fn read_media_fields(state: &AppState, request: Request) -> ApiResult<MediaFields> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"));
    if !is_multipart {
        return Err(ApiError::MissingInput(
            "Expected a multipart/form-data upload".to_string(),
        ));
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let max_bytes = state.config.max_upload_bytes;

    let mut image: Option<IncomingFile> = None;
    let mut audio: Option<IncomingFile> = None;
    let mut aspect_ratio: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let kind = match name.as_str() {
            "image" => AssetKind::Image,
            "audio" => AssetKind::Audio,
            "aspectRatio" | "aspect_ratio" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidInput(e.body_text()))?;
                aspect_ratio = Some(text);
                continue;
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
                continue;
            }
        };

        let file_name = field.file_name().unwrap_or(&name).to_string();
        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(e.body_text()))?;
        if bytes.is_empty() {
            continue;
        }

        let slot = match kind {
            AssetKind::Image => &mut image,
            AssetKind::Audio => &mut audio,
        };
        if slot.is_some() {
            return Err(ApiError::MissingInput(
                "Exactly one image file and one audio file are required".to_string(),
            ));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::UploadFailed(StorageError::Rejected(format!(
                "{} exceeds the {} byte limit",
                file_name, max_bytes
            ))));
        }

        let mime_type = resolve_mime_type(kind, declared, &file_name, &bytes)?;
        tracing::info!(kind = ?kind, file_name = %file_name, size_bytes = bytes.len(), "Received file");
        *slot = Some(IncomingFile {
            kind,
            file_name,
            mime_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(MediaFields {
        image,
        audio,
        aspect_ratio,
    })
}

fn parse_aspect_ratio(raw: Option<&str>) -> ApiResult<AspectRatio> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(AspectRatio::default()),
        Some(value) => AspectRatio::from_str(value).map_err(|_| {
            ApiError::InvalidInput(format!("aspectRatio must be 16:9 or 9:16, got {value}"))
        }),
    }
}

/// Trust a specific declared type; otherwise sniff images by magic bytes
/// and audio by file extension.
fn resolve_mime_type(
    kind: AssetKind,
    declared: Option<String>,
    file_name: &str,
    bytes: &[u8],
) -> ApiResult<String> {
    let declared = declared
        .map(|m| m.to_ascii_lowercase())
        .filter(|m| !m.is_empty() && m != "application/octet-stream");

    let mime_type = match (declared, kind) {
        (Some(mime), _) => mime,
        (None, AssetKind::Image) => image::guess_format(bytes)
            .map(|format| format.to_mime_type().to_string())
            .map_err(|_| ApiError::InvalidInput("Image format not recognized".to_string()))?,
        (None, AssetKind::Audio) => audio_mime_from_name(file_name)
            .ok_or_else(|| ApiError::InvalidInput("Audio format not recognized".to_string()))?
            .to_string(),
    };

    if !kind.accepts(&mime_type) {
        return Err(ApiError::InvalidInput(format!(
            "{} must be an {} file, got {}",
            file_name,
            kind.as_str(),
            mime_type
        )));
    }
    Ok(mime_type)
}

fn audio_mime_from_name(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "webm" => Some("audio/webm"),
        _ => None,
    }
}

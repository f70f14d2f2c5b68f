use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::media_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::media::NewPayload;
use crate::storage::models::{MediaKind, PayloadRef, SlotRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SlotResponse {
    pub index: u32,
    pub kind: MediaKind,
    pub url: String,
    pub source: &'static str,
    pub mime_type: Option<String>,
    pub byte_size: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub kind: MediaKind,
    pub capacity: u32,
    pub items: Vec<SlotResponse>,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: u64,
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub url: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JSend<SlotResponse>>), ApiError> {
    let kind = parse_kind(&kind)?;
    let payload = read_upload(&state, kind, multipart).await?;

    let slot = state
        .media
        .add(&user_id, kind, payload)
        .await
        .map_err(media_error)?;

    Ok((StatusCode::CREATED, slot_to_response(kind, &slot)))
}

pub async fn add_link(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind)): Path<(String, String)>,
    AppJson(req): AppJson<LinkRequest>,
) -> Result<(StatusCode, Json<JSend<SlotResponse>>), ApiError> {
    let kind = parse_kind(&kind)?;

    let slot = state
        .media
        .add(&user_id, kind, NewPayload::Link { url: req.url })
        .await
        .map_err(media_error)?;

    Ok((StatusCode::CREATED, slot_to_response(kind, &slot)))
}

pub async fn replace_media(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind, index)): Path<(String, String, u32)>,
    multipart: Multipart,
) -> Result<Json<JSend<SlotResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let payload = read_upload(&state, kind, multipart).await?;

    let slot = state
        .media
        .replace(&user_id, kind, index, payload)
        .await
        .map_err(media_error)?;

    Ok(slot_to_response(kind, &slot))
}

pub async fn replace_link(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind, index)): Path<(String, String, u32)>,
    AppJson(req): AppJson<LinkRequest>,
) -> Result<Json<JSend<SlotResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let slot = state
        .media
        .replace(&user_id, kind, index, NewPayload::Link { url: req.url })
        .await
        .map_err(media_error)?;

    Ok(slot_to_response(kind, &slot))
}

pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind)): Path<(String, String)>,
) -> Result<Json<JSend<MediaListResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let slots = state
        .media
        .list(&user_id, kind)
        .await
        .map_err(media_error)?;

    let items = slots.iter().map(|s| slot_response(kind, s)).collect();
    Ok(JSend::success(MediaListResponse {
        kind,
        capacity: state.media.capacity(kind),
        items,
    }))
}

pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind, index)): Path<(String, String, u32)>,
) -> Result<Json<JSend<()>>, ApiError> {
    let kind = parse_kind(&kind)?;

    state
        .media
        .delete(&user_id, kind, index)
        .await
        .map_err(media_error)?;

    Ok(JSend::success(()))
}

pub async fn clear_media(
    State(state): State<Arc<AppState>>,
    Path((user_id, kind)): Path<(String, String)>,
) -> Result<Json<JSend<RemovedResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;

    let removed = state
        .media
        .delete_all(&user_id, kind)
        .await
        .map_err(media_error)?;

    Ok(JSend::success(RemovedResponse { removed }))
}

pub async fn purge_user_media(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<JSend<RemovedResponse>>, ApiError> {
    let removed = state
        .media
        .purge_user(&user_id)
        .await
        .map_err(media_error)?;

    Ok(JSend::success(RemovedResponse { removed }))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_kind(kind: &str) -> Result<MediaKind, ApiError> {
    kind.parse()
        .map_err(|_| ApiError::not_found(format!("unknown media kind '{kind}'")))
}

/// Pull the `file` field out of a multipart body and size-check it.
async fn read_upload(
    state: &AppState,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<NewPayload, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }

                file_data = Some(data);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    // MIME type: from multipart Content-Type, or guessed from the filename
    let mime_type = file_content_type
        .filter(|ct| ct != "application/octet-stream")
        .or_else(|| {
            file_name
                .as_deref()
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    if !kind.accepts_mime(&mime_type) {
        return Err(ApiError::bad_request(format!(
            "{mime_type} is not accepted for {kind}"
        )));
    }

    Ok(NewPayload::Upload {
        data,
        file_name,
        mime_type,
    })
}

fn slot_response(kind: MediaKind, slot: &SlotRecord) -> SlotResponse {
    let (url, source) = match &slot.payload {
        PayloadRef::Upload(key) => (format!("/assets/{key}"), "upload"),
        PayloadRef::Link(url) => (url.clone(), "link"),
    };

    SlotResponse {
        index: slot.index,
        kind,
        url,
        source,
        mime_type: slot.mime_type.clone(),
        byte_size: slot.byte_size,
        created_at: slot.created_at.to_rfc3339(),
        updated_at: slot.updated_at.to_rfc3339(),
    }
}

fn slot_to_response(kind: MediaKind, slot: &SlotRecord) -> Json<JSend<SlotResponse>> {
    JSend::success(slot_response(kind, slot))
}

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::AppState;

/// Serve uploaded asset content by key.
/// Route: GET /assets/:key
pub async fn serve_asset(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(key): axum::extract::Path<String>,
) -> Result<Response, ApiError> {
    let data = state.assets.get(&key).await.map_err(|e| match e {
        crate::asset_store::AssetStoreError::NotFound(_) => ApiError::not_found("Asset not found"),
        _ => ApiError::internal(format!("Failed to retrieve asset: {e}")),
    })?;

    // Keys end in the sanitized original filename, so the extension drives
    // the content type.
    let mime_type = mime_guess::from_path(&key)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let byte_size = data.len() as u64;
    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(byte_size));

    if let Ok(value) = format!("inline; filename=\"{key}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Asset content is immutable: replace writes a new key and deletes the
    // old file, so long caching is safe.
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}

mod admin;
mod assets;
mod media;

use crate::api::response::ApiError;
use crate::media::MediaError;

pub use admin::{admin_purge, health};
pub use assets::serve_asset;
pub use media::{
    add_link, clear_media, delete_media, list_media, purge_user_media, replace_link,
    replace_media, upload_media,
};

/// Map a MediaError to an ApiError with a stable status per variant.
fn media_error(e: MediaError) -> ApiError {
    match e {
        MediaError::CapacityExceeded { .. } => ApiError::forbidden(e.to_string()),
        MediaError::NotFound { .. } => ApiError::not_found(e.to_string()),
        MediaError::InvalidPayload(_) => ApiError::bad_request(e.to_string()),
        MediaError::Database(_) | MediaError::Asset(_) => ApiError::internal(e.to_string()),
    }
}

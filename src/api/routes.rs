use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Media collections
        .route("/users/:user_id/media", delete(handlers::purge_user_media))
        .route("/users/:user_id/media/:kind", get(handlers::list_media))
        .route(
            "/users/:user_id/media/:kind",
            post(handlers::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/users/:user_id/media/:kind", delete(handlers::clear_media))
        .route("/users/:user_id/media/:kind/links", post(handlers::add_link))
        .route(
            "/users/:user_id/media/:kind/links/:index",
            put(handlers::replace_link),
        )
        .route(
            "/users/:user_id/media/:kind/:index",
            put(handlers::replace_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/users/:user_id/media/:kind/:index",
            delete(handlers::delete_media),
        )
        // Asset content
        .route("/assets/:key", get(handlers::serve_asset))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

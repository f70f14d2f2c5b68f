//! talent-media - Profile media API with bounded, index-addressed media slots
//!
//! This crate manages the per-user media collections of a talent
//! marketplace profile (gallery images, videos, portfolio pieces, the
//! introduction video) with:
//! - A hard slot capacity per media kind, lowest-free-index allocation and
//!   hole reuse
//! - A uniqueness guard on (group, index) at the persistence layer, making
//!   concurrent adds safe without locks
//! - Swappable asset storage behind a trait (local filesystem backend)
//! - redb embedded database for slot metadata (ACID, MVCC, crash-safe)
//! - REST API with multipart upload and external-link slots

pub mod api;
pub mod asset_store;
pub mod config;
pub mod media;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use media::MediaService;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub media: MediaService,
    pub assets: Arc<dyn asset_store::AssetStore>,
}

//! Shared test helpers for talent-media unit tests.

use std::sync::Arc;

use crate::asset_store::LocalStore;
use crate::config::{Config, MediaQuotas, NodeConfig, StorageConfig};
use crate::media::MediaService;
use crate::storage::Database;
use crate::AppState;

/// Create a MediaService backed by a temporary database and asset directory.
pub fn test_service() -> (tempfile::TempDir, MediaService) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::open(temp_dir.path().join("data")).expect("Failed to open test database");
    let assets =
        LocalStore::new(temp_dir.path().join("uploads")).expect("Failed to create asset store");
    let service = MediaService::new(db, Arc::new(assets), MediaQuotas::default());
    (temp_dir, service)
}

/// Create a test AppState with a temporary database and local asset store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let asset_dir = temp_dir.path().join("uploads");

    let config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            asset_path: asset_dir.to_string_lossy().to_string(),
        },
        quotas: MediaQuotas::default(),
        test_mode: true,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let assets: Arc<dyn crate::asset_store::AssetStore> =
        Arc::new(LocalStore::new(&asset_dir).expect("Failed to create test asset store"));
    let media = MediaService::new(db.clone(), Arc::clone(&assets), config.quotas);

    Arc::new(AppState {
        config,
        db,
        media,
        assets,
    })
}

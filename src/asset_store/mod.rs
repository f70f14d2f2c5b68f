mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over binary asset storage. A key is owned by exactly one slot
/// row; deleting that row is the only trigger for deleting its asset.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), AssetStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, AssetStoreError>;
    async fn delete(&self, key: &str) -> Result<(), AssetStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, AssetStoreError>;
}

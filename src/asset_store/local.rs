use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{AssetStore, AssetStoreError};

/// Local filesystem asset store. The directory is created when the store is
/// constructed, never as an ambient side effect.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn asset_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl AssetStore for LocalStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), AssetStoreError> {
        let path = self.asset_path(key);
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, AssetStoreError> {
        let path = self.asset_path(key);
        if !path.exists() {
            return Err(AssetStoreError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), AssetStoreError> {
        let path = self.asset_path(key);
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AssetStoreError> {
        let path = self.asset_path(key);
        Ok(path.exists())
    }
}

use thiserror::Error;

use crate::storage::models::MediaKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    pub quotas: MediaQuotas,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory for uploaded asset files
    pub asset_path: String,
}

/// Free-tier slot capacities per media kind. Fixed constants today; routing
/// them through configuration keeps a paid-tier override a plumbing change
/// rather than an algorithm change.
#[derive(Debug, Clone, Copy)]
pub struct MediaQuotas {
    pub images: u32,
    pub videos: u32,
    pub portfolio: u32,
    pub intro: u32,
}

impl Default for MediaQuotas {
    fn default() -> Self {
        Self {
            images: 5,
            videos: 2,
            portfolio: 2,
            intro: 1,
        }
    }
}

impl MediaQuotas {
    pub fn capacity(&self, kind: MediaKind) -> u32 {
        match kind {
            MediaKind::Image => self.images,
            MediaKind::Video => self.videos,
            MediaKind::Portfolio => self.portfolio,
            MediaKind::Intro => self.intro,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            asset_path: "./uploads".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let asset_path = std::env::var("ASSET_PATH").unwrap_or_else(|_| "./uploads".to_string());

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // 10MB

        let defaults = MediaQuotas::default();
        let quotas = MediaQuotas {
            images: env_u32("MEDIA_IMAGE_SLOTS", defaults.images),
            videos: env_u32("MEDIA_VIDEO_SLOTS", defaults.videos),
            portfolio: env_u32("MEDIA_PORTFOLIO_SLOTS", defaults.portfolio),
            intro: env_u32("MEDIA_INTRO_SLOTS", defaults.intro),
        };

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig { asset_path },
            quotas,
            test_mode,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        for kind in MediaKind::ALL {
            if self.quotas.capacity(kind) == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "slot capacity for {kind} must be greater than 0"
                )));
            }
        }

        Ok(())
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

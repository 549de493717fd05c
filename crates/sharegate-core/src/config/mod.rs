//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod library;
pub mod logging;
pub mod queue;
pub mod storage;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::{AuthConfig, TokenConfig};
pub use self::library::LibraryConfig;
pub use self::logging::LoggingConfig;
pub use self::queue::{AdoptionConfig, DownloadQueueConfig};
pub use self::storage::{LocalStorageConfig, S3StorageConfig, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Secrets for account tokens and presigned handles.
    pub auth: AuthConfig,
    /// Lifetimes of issued tokens.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Object store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Download admission controller settings.
    #[serde(default)]
    pub download_queue: DownloadQueueConfig,
    /// Adoption pipeline timeouts.
    #[serde(default)]
    pub adoption: AdoptionConfig,
    /// Per-user library limits.
    #[serde(default)]
    pub library: LibraryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL, or `"memory"` for the in-process stores.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Whether the in-process stores were requested instead of PostgreSQL.
    pub fn is_memory(&self) -> bool {
        self.url == "memory"
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SHAREGATE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SHAREGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject unusable settings and warn about questionable ones.
    pub fn validate(&self) -> Result<(), AppError> {
        for warning in self.download_queue.validate()? {
            warn!(%warning, "Download queue configuration");
        }
        self.adoption.validate()?;
        self.library.validate()?;

        if self.auth.token_secret.len() < 16 {
            return Err(AppError::configuration(
                "auth.token_secret must be at least 16 characters",
            ));
        }
        if self.storage.provider == "s3" && self.storage.s3.bucket.is_empty() {
            return Err(AppError::configuration(
                "storage.s3.bucket is required when storage.provider = \"s3\"",
            ));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

//! Builds the configured object store.

use std::sync::Arc;

use tracing::info;

use sharegate_auth::token::TokenIssuer;
use sharegate_core::config::AppConfig;
use sharegate_core::error::AppError;
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::ObjectStore;

use crate::providers::LocalObjectStore;

/// The active store, plus the local store when that is the provider so the
/// token redemption routes can stream through it.
#[derive(Debug, Clone)]
pub struct BuiltStore {
    /// Store used by every service.
    pub store: Arc<dyn ObjectStore>,
    /// Present only for the local provider.
    pub local: Option<Arc<LocalObjectStore>>,
}

/// Construct the store named by `storage.provider`.
pub async fn build_object_store(config: &AppConfig, issuer: TokenIssuer) -> AppResult<BuiltStore> {
    match config.storage.provider.as_str() {
        "local" => {
            let local = Arc::new(
                LocalObjectStore::new(
                    &config.storage.local.root_path,
                    &config.server.public_url,
                    issuer,
                )
                .await?,
            );
            info!(root = %config.storage.local.root_path, "Using local object store");
            Ok(BuiltStore {
                store: local.clone(),
                local: Some(local),
            })
        }
        #[cfg(feature = "s3")]
        "s3" => {
            let s3 = crate::providers::S3ObjectStore::new(&config.storage.s3).await?;
            Ok(BuiltStore {
                store: Arc::new(s3),
                local: None,
            })
        }
        other => Err(AppError::configuration(format!(
            "Unsupported storage provider: {other}"
        ))),
    }
}

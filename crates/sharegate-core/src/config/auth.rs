//! Secrets and token lifetimes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Signing secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify owner access tokens issued by the
    /// account service.
    pub jwt_secret: String,
    /// HMAC secret used by the token issuer for presigned handles and
    /// registration tokens. Must differ from `jwt_secret`.
    pub token_secret: String,
    /// Clock-skew leeway in seconds when validating owner access tokens.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

/// Time-to-live for each kind of issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Lifetime of presigned download handles.
    #[serde(default = "default_transfer_ttl")]
    pub download_ttl_seconds: u64,
    /// Lifetime of presigned upload handles.
    #[serde(default = "default_transfer_ttl")]
    pub upload_ttl_seconds: u64,
    /// Lifetime of reverse-share registration tokens.
    #[serde(default = "default_registration_ttl")]
    pub registration_ttl_seconds: u64,
}

impl TokenConfig {
    /// Download handle TTL.
    pub fn download_ttl(&self) -> Duration {
        Duration::from_secs(self.download_ttl_seconds)
    }

    /// Upload handle TTL.
    pub fn upload_ttl(&self) -> Duration {
        Duration::from_secs(self.upload_ttl_seconds)
    }

    /// Registration token TTL.
    pub fn registration_ttl(&self) -> Duration {
        Duration::from_secs(self.registration_ttl_seconds)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            download_ttl_seconds: default_transfer_ttl(),
            upload_ttl_seconds: default_transfer_ttl(),
            registration_ttl_seconds: default_registration_ttl(),
        }
    }
}

fn default_leeway() -> u64 {
    5
}

fn default_transfer_ttl() -> u64 {
    3600
}

fn default_registration_ttl() -> u64 {
    600
}

//! Claims carried by issued tokens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sharegate_core::traits::storage::Transfer;

/// The single operation a token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOperation {
    /// One PUT of an object body.
    Upload,
    /// One GET of an object body.
    Download,
    /// One register-file call against a reverse share.
    Register,
}

impl From<Transfer> for TokenOperation {
    fn from(transfer: Transfer) -> Self {
        match transfer {
            Transfer::Upload => Self::Upload,
            Transfer::Download => Self::Download,
        }
    }
}

impl fmt::Display for TokenOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
            Self::Register => f.write_str("register"),
        }
    }
}

/// Signed payload of an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Resource reference: an object name, or `{reverseShareId}/{objectName}`
    /// for registration tokens.
    pub sub: String,
    /// Authorized operation.
    pub op: TokenOperation,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Unique token id, only used for log correlation.
    pub jti: Uuid,
}

/// A validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    /// Resource the token was issued for.
    pub resource: String,
    /// Operation the token authorizes.
    pub operation: TokenOperation,
    /// When the token stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Grant {
    /// Split a registration resource into `(reverse_share_id, object_name)`.
    pub fn registration_parts(&self) -> Option<(Uuid, &str)> {
        let (id, object) = self.resource.split_once('/')?;
        Some((id.parse().ok()?, object))
    }
}

/// Resource reference bound into a registration token.
pub fn registration_resource(reverse_share_id: Uuid, object_name: &str) -> String {
    format!("{reverse_share_id}/{object_name}")
}

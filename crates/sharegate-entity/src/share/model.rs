//! Share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An owner-created, read-only bundle of library files.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    /// Unique share identifier.
    pub id: Uuid,
    /// Optional display name.
    pub name: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// After this instant the share never resolves again.
    pub expiration: Option<DateTime<Utc>>,
    /// Maximum number of successful resolutions.
    pub max_views: Option<i32>,
    /// Successful resolutions so far.
    pub views: i32,
    /// Argon2 hash of the share password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Owning user.
    pub owner_id: Uuid,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
    /// When the share was last modified by its owner.
    pub updated_at: DateTime<Utc>,
}

impl Share {
    /// Whether a password must be verified before resolution.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the share is past its expiration at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| now > expiration)
    }

    /// Whether the view limit has been used up.
    pub fn is_exhausted(&self) -> bool {
        self.max_views.is_some_and(|max| self.views >= max)
    }
}

/// Data required to create a new share.
#[derive(Debug, Clone)]
pub struct CreateShare {
    /// Optional display name.
    pub name: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Optional expiration.
    pub expiration: Option<DateTime<Utc>>,
    /// Optional view limit.
    pub max_views: Option<i32>,
    /// Already-hashed password.
    pub password_hash: Option<String>,
    /// Owning user.
    pub owner_id: Uuid,
}

/// Owner-editable share attributes. `None` leaves a field unchanged;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateShare {
    /// New display name.
    pub name: Option<Option<String>>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New expiration.
    pub expiration: Option<Option<DateTime<Utc>>>,
    /// New view limit.
    pub max_views: Option<Option<i32>>,
}

impl UpdateShare {
    /// Apply the changes to an in-memory share.
    pub fn apply_to(&self, share: &mut Share) {
        if let Some(name) = &self.name {
            share.name = name.clone();
        }
        if let Some(description) = &self.description {
            share.description = description.clone();
        }
        if let Some(expiration) = self.expiration {
            share.expiration = expiration;
        }
        if let Some(max_views) = self.max_views {
            share.max_views = max_views;
        }
        share.updated_at = Utc::now();
    }
}

/// Globally unique slug mapped 1:1 to a share.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareAlias {
    /// The slug.
    pub alias: String,
    /// The share it resolves to.
    pub share_id: Uuid,
    /// When the alias was (re)assigned.
    pub created_at: DateTime<Utc>,
}

/// An email address notified about a share.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecipient {
    /// The share.
    pub share_id: Uuid,
    /// Lower-cased email address.
    pub email: String,
    /// When the recipient was added.
    pub created_at: DateTime<Utc>,
}

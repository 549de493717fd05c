//! Reverse share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An owner-created collection point accepting anonymous uploads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReverseShare {
    /// Unique reverse share identifier.
    pub id: Uuid,
    /// Display name shown to uploaders.
    pub name: Option<String>,
    /// Description shown to uploaders.
    pub description: Option<String>,
    /// After this instant no uploads are authorized.
    pub expiration: Option<DateTime<Utc>>,
    /// Maximum number of registered files.
    pub max_files: Option<i32>,
    /// Maximum size of a single file in bytes.
    pub max_file_size: Option<i64>,
    /// Comma-separated list of accepted extensions.
    pub allowed_file_types: Option<String>,
    /// Argon2 hash of the upload password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Inactive reverse shares reject every resolution.
    pub is_active: bool,
    /// Owning user.
    pub owner_id: Uuid,
    /// When the reverse share was created.
    pub created_at: DateTime<Utc>,
    /// When the reverse share was last modified.
    pub updated_at: DateTime<Utc>,
}

impl ReverseShare {
    /// Whether a password must be verified before resolution.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the reverse share is past its expiration at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| now > expiration)
    }

    /// Whether `extension` is accepted. An empty or missing list accepts
    /// everything; comparison ignores case and a leading dot.
    pub fn allows_extension(&self, extension: &str) -> bool {
        let Some(list) = self.allowed_file_types.as_deref() else {
            return true;
        };
        let wanted = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        let mut allowed = list
            .split(',')
            .map(|t| t.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .peekable();
        if allowed.peek().is_none() {
            return true;
        }
        allowed.any(|t| t == wanted)
    }

    /// Whether a file of `size` bytes is within the per-file limit.
    pub fn allows_size(&self, size: i64) -> bool {
        self.max_file_size.is_none_or(|max| size <= max)
    }
}

/// Data required to create a reverse share.
#[derive(Debug, Clone)]
pub struct CreateReverseShare {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Optional expiration.
    pub expiration: Option<DateTime<Utc>>,
    /// Optional file count limit.
    pub max_files: Option<i32>,
    /// Optional per-file size limit.
    pub max_file_size: Option<i64>,
    /// Optional extension allow-list.
    pub allowed_file_types: Option<String>,
    /// Already-hashed password.
    pub password_hash: Option<String>,
    /// Owning user.
    pub owner_id: Uuid,
}

/// Owner-editable reverse share attributes. `None` leaves a field
/// unchanged; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateReverseShare {
    /// New display name.
    pub name: Option<Option<String>>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New expiration.
    pub expiration: Option<Option<DateTime<Utc>>>,
    /// New file count limit.
    pub max_files: Option<Option<i32>>,
    /// New per-file size limit.
    pub max_file_size: Option<Option<i64>>,
    /// New extension allow-list.
    pub allowed_file_types: Option<Option<String>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl UpdateReverseShare {
    /// Apply the changes to an in-memory reverse share.
    pub fn apply_to(&self, reverse_share: &mut ReverseShare) {
        if let Some(name) = &self.name {
            reverse_share.name = name.clone();
        }
        if let Some(description) = &self.description {
            reverse_share.description = description.clone();
        }
        if let Some(expiration) = self.expiration {
            reverse_share.expiration = expiration;
        }
        if let Some(max_files) = self.max_files {
            reverse_share.max_files = max_files;
        }
        if let Some(max_file_size) = self.max_file_size {
            reverse_share.max_file_size = max_file_size;
        }
        if let Some(types) = &self.allowed_file_types {
            reverse_share.allowed_file_types = types.clone();
        }
        if let Some(active) = self.is_active {
            reverse_share.is_active = active;
        }
        reverse_share.updated_at = Utc::now();
    }
}

/// Globally unique slug mapped 1:1 to a reverse share.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReverseShareAlias {
    /// The slug.
    pub alias: String,
    /// The reverse share it resolves to.
    pub reverse_share_id: Uuid,
    /// When the alias was (re)assigned.
    pub created_at: DateTime<Utc>,
}

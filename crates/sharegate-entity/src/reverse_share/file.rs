//! Files registered against a reverse share.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Where an uploaded file is in its move into the owner's library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "adoption_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdoptionState {
    /// Registered, not adopted yet.
    Pending,
    /// Copied into the owner's library.
    Adopted,
    /// The last adoption attempt failed; terminal for this record.
    Failed,
}

impl AdoptionState {
    /// Only `pending → adopted` and `pending → failed` are legal.
    pub fn can_transition_to(self, next: AdoptionState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Adopted) | (Self::Pending, Self::Failed)
        )
    }
}

impl fmt::Display for AdoptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Adopted => f.write_str("adopted"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// A file registered after a direct-to-storage anonymous upload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReverseShareFile {
    /// Unique file identifier.
    pub id: Uuid,
    /// The reverse share the file was uploaded to.
    pub reverse_share_id: Uuid,
    /// Display name without extension.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    /// Stored size in bytes.
    pub size: i64,
    /// Object name in the store.
    pub object_name: String,
    /// Name the uploader gave, if any.
    pub uploader_name: Option<String>,
    /// Email the uploader gave, if any.
    pub uploader_email: Option<String>,
    /// Adoption progress.
    pub adoption_state: AdoptionState,
    /// Library file created by a successful adoption.
    pub adopted_file_id: Option<Uuid>,
    /// When the file was registered.
    pub registered_at: DateTime<Utc>,
}

impl ReverseShareFile {
    /// `name.extension`, or just `name` when there is no extension.
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }
}

/// Data required to register an uploaded object.
#[derive(Debug, Clone)]
pub struct NewReverseShareFile {
    /// The reverse share.
    pub reverse_share_id: Uuid,
    /// Display name without extension.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    /// Stored size in bytes.
    pub size: i64,
    /// Object name in the store.
    pub object_name: String,
    /// Name the uploader gave, if any.
    pub uploader_name: Option<String>,
    /// Email the uploader gave, if any.
    pub uploader_email: Option<String>,
}

impl From<&ReverseShareFile> for NewReverseShareFile {
    fn from(file: &ReverseShareFile) -> Self {
        Self {
            reverse_share_id: file.reverse_share_id,
            name: file.name.clone(),
            extension: file.extension.clone(),
            size: file.size,
            object_name: file.object_name.clone(),
            uploader_name: file.uploader_name.clone(),
            uploader_email: file.uploader_email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_monotonic() {
        use AdoptionState::*;
        assert!(Pending.can_transition_to(Adopted));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Adopted.can_transition_to(Pending));
        assert!(!Adopted.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Adopted));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&AdoptionState::Adopted).unwrap();
        assert_eq!(json, "\"adopted\"");
    }
}

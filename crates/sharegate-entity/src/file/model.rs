//! Library file entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An object in a user's permanent library.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// Display name without extension.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    /// Size in bytes.
    pub size: i64,
    /// Object name in the store.
    pub object_name: String,
    /// Owning user.
    pub owner_id: Uuid,
    /// When the file entered the library.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a library entry.
#[derive(Debug, Clone)]
pub struct CreateFile {
    /// Display name without extension.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    /// Size in bytes.
    pub size: i64,
    /// Object name in the store.
    pub object_name: String,
    /// Owning user.
    pub owner_id: Uuid,
}

/// Build the library object name for a new file:
/// `{owner}/{unix_millis}-{sanitized name}[.{extension}]`.
pub fn library_object_name(owner_id: Uuid, name: &str, extension: &str, now: DateTime<Utc>) -> String {
    let stem = sanitize(name);
    let extension = sanitize(extension);
    if extension.is_empty() {
        format!("{owner_id}/{}-{stem}", now.timestamp_millis())
    } else {
        format!("{owner_id}/{}-{stem}.{extension}", now.timestamp_millis())
    }
}

/// Split `report.final.pdf` into `("report.final", "pdf")`. Names without
/// a dot, or with only a leading dot, have an empty extension.
pub fn split_file_name(file_name: &str) -> (String, String) {
    let file_name = file_name.trim();
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            (stem.to_string(), extension.to_ascii_lowercase())
        }
        _ => (file_name.to_string(), String::new()),
    }
}

/// Keep object names to a portable character set.
pub fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .trim_start_matches('.')
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() && !segment.trim().is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

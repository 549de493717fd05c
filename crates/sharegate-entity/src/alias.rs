//! Human-readable slugs for anonymous lookup.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sharegate_core::error::AppError;

/// Minimum alias length.
pub const MIN_ALIAS_LEN: usize = 3;
/// Maximum alias length.
pub const MAX_ALIAS_LEN: usize = 100;
/// Length of generated aliases.
const GENERATED_ALIAS_LEN: usize = 10;

/// A validated slug: `[A-Za-z0-9_-]{3,100}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alias(String);

impl Alias {
    /// Validate a caller-supplied slug.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.len() < MIN_ALIAS_LEN || raw.len() > MAX_ALIAS_LEN {
            return Err(AppError::validation(format!(
                "Alias must be between {MIN_ALIAS_LEN} and {MAX_ALIAS_LEN} characters"
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::validation(
                "Alias may only contain letters, numbers, hyphens and underscores",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Produce a random slug for entities created without one.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..GENERATED_ALIAS_LEN].to_string())
    }

    /// Borrow the slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Alias {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Alias> for String {
    fn from(alias: Alias) -> Self {
        alias.0
    }
}

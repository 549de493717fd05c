//! Per-user library limits.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Limits applied whenever a file enters a user's library, by direct
/// registration or by adoption from a reverse share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Largest single file accepted into a library.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Ceiling on the summed size of one user's library.
    #[serde(default = "default_max_total_storage")]
    pub max_total_storage_per_user_bytes: u64,
}

impl LibraryConfig {
    /// Both limits must be non-zero.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_file_size_bytes == 0 || self.max_total_storage_per_user_bytes == 0 {
            return Err(AppError::configuration(
                "library limits must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            max_total_storage_per_user_bytes: default_max_total_storage(),
        }
    }
}

fn default_max_file_size() -> u64 {
    1024 * 1024 * 1024 // 1 GiB
}

fn default_max_total_storage() -> u64 {
    10 * 1024 * 1024 * 1024 // 10 GiB
}

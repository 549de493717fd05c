//! Library size limits.

use uuid::Uuid;

use sharegate_core::config::LibraryConfig;
use sharegate_core::error::AppError;
use sharegate_core::result::AppResult;
use sharegate_database::Repositories;

const MIB: f64 = 1024.0 * 1024.0;

/// Checks a file against the per-file and per-user library limits.
#[derive(Debug, Clone)]
pub struct StorageQuota {
    repos: Repositories,
    limits: LibraryConfig,
}

impl StorageQuota {
    pub fn new(repos: Repositories, limits: LibraryConfig) -> Self {
        Self { repos, limits }
    }

    /// Fails with `Validation` if `size` bytes may not enter the owner's
    /// library.
    pub async fn check(&self, owner_id: Uuid, size: i64) -> AppResult<()> {
        let size = u64::try_from(size).unwrap_or(0);
        let max_file = self.limits.max_file_size_bytes;
        if size > max_file {
            return Err(AppError::validation(format!(
                "File size exceeds the maximum allowed size of {}MB",
                max_file as f64 / MIB
            )));
        }

        let used = u64::try_from(self.repos.files.total_size(owner_id).await?).unwrap_or(0);
        let total = self.limits.max_total_storage_per_user_bytes;
        if used.saturating_add(size) > total {
            let available = total.saturating_sub(used) as f64 / MIB;
            return Err(AppError::validation(format!(
                "Insufficient storage space. You have {available:.2}MB available"
            )));
        }
        Ok(())
    }
}

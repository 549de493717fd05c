//! Download admission and adoption settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Download admission controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadQueueConfig {
    /// Hard ceiling on simultaneous active transfers.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Hard ceiling on waiting entries.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Transfers of objects smaller than this bypass the queue entirely.
    #[serde(default = "default_min_file_size")]
    pub min_file_size_bytes: u64,
    /// Service time assumed before any transfer has completed.
    #[serde(default = "default_service_time")]
    pub default_service_time_ms: u64,
    /// Number of completed transfers in the rolling average.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Active transfers older than this are force-released.
    #[serde(default = "default_stale_active")]
    pub stale_active_seconds: u64,
    /// Queued entries older than this are rejected.
    #[serde(default = "default_stale_queued")]
    pub stale_queued_seconds: u64,
    /// Period of the stale-entry sweep.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl DownloadQueueConfig {
    /// Checks hard limits and returns soft warnings.
    pub fn validate(&self) -> Result<Vec<String>, AppError> {
        if self.max_concurrent < 1 {
            return Err(AppError::configuration(format!(
                "download_queue.max_concurrent must be >= 1, got: {}",
                self.max_concurrent
            )));
        }
        if self.max_queue_size < 1 {
            return Err(AppError::configuration(format!(
                "download_queue.max_queue_size must be >= 1, got: {}",
                self.max_queue_size
            )));
        }
        if self.history_window < 1 {
            return Err(AppError::configuration(
                "download_queue.history_window must be >= 1",
            ));
        }

        let mut warnings = Vec::new();
        if self.max_concurrent > 50 {
            warnings.push(format!(
                "max_concurrent is very high ({}), the object store may throttle",
                self.max_concurrent
            ));
        }
        let recommended = self.max_concurrent * 5;
        if self.max_queue_size < self.max_concurrent {
            warnings.push(format!(
                "max_queue_size ({}) is smaller than max_concurrent ({})",
                self.max_queue_size, self.max_concurrent
            ));
        } else if self.max_queue_size < recommended {
            warnings.push(format!(
                "max_queue_size ({}) might be too small, recommended: {recommended}",
                self.max_queue_size
            ));
        }
        if self.max_queue_size > 1000 {
            warnings.push(format!(
                "max_queue_size is very high ({})",
                self.max_queue_size
            ));
        }
        Ok(warnings)
    }

    /// Seed of the rolling service-time average.
    pub fn default_service_time(&self) -> Duration {
        Duration::from_millis(self.default_service_time_ms)
    }

    /// Age after which an active transfer is considered abandoned.
    pub fn stale_active(&self) -> Duration {
        Duration::from_secs(self.stale_active_seconds)
    }

    /// Age after which a queued entry is rejected.
    pub fn stale_queued(&self) -> Duration {
        Duration::from_secs(self.stale_queued_seconds)
    }

    /// Period of the stale-entry sweep.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

impl Default for DownloadQueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_queue_size: default_max_queue_size(),
            min_file_size_bytes: default_min_file_size(),
            default_service_time_ms: default_service_time(),
            history_window: default_history_window(),
            stale_active_seconds: default_stale_active(),
            stale_queued_seconds: default_stale_queued(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Adoption pipeline timeouts. The two budgets are independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoptionConfig {
    /// Timeout of the storage liveness probe.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    /// Hard deadline of the object copy.
    #[serde(default = "default_copy_deadline")]
    pub copy_deadline_seconds: u64,
}

impl AdoptionConfig {
    /// Liveness probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Copy deadline.
    pub fn copy_deadline(&self) -> Duration {
        Duration::from_secs(self.copy_deadline_seconds)
    }

    /// Both budgets must be non-zero.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.probe_timeout_seconds == 0 || self.copy_deadline_seconds == 0 {
            return Err(AppError::configuration(
                "adoption timeouts must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for AdoptionConfig {
    fn default() -> Self {
        Self {
            probe_timeout_seconds: default_probe_timeout(),
            copy_deadline_seconds: default_copy_deadline(),
        }
    }
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_queue_size() -> usize {
    15
}

fn default_min_file_size() -> u64 {
    3 * 1024 * 1024 * 1024 // 3 GiB
}

fn default_service_time() -> u64 {
    30_000
}

fn default_history_window() -> usize {
    20
}

fn default_stale_active() -> u64 {
    600
}

fn default_stale_queued() -> u64 {
    1800
}

fn default_cleanup_interval() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_copy_deadline() -> u64 {
    600
}

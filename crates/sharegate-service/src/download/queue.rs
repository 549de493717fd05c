//! FIFO admission queue with a concurrency ceiling.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sharegate_core::config::DownloadQueueConfig;
use sharegate_core::error::AppError;
use sharegate_core::result::AppResult;
use sharegate_core::types::id::DownloadId;

use super::permit::{ActivePermit, QueueWaiter};

/// Descriptive fields shown in queue listings.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadMeta {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
}

/// Outcome of [`DownloadQueue::enqueue`].
#[derive(Debug)]
pub enum Enqueued {
    /// The transfer may start now.
    Admitted(ActivePermit),
    /// The transfer waits; `waiter` resolves when it is promoted.
    Queued {
        position: usize,
        wait_time: Duration,
        waiter: QueueWaiter,
    },
}

/// Where a single download stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    Queued,
    Active,
}

/// Status of one download as reported to its client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatus {
    pub download_id: DownloadId,
    pub state: DownloadState,
    /// 1-based FIFO position; zero once active.
    pub position: usize,
    /// Estimated wait in milliseconds; zero once active.
    #[serde(rename = "waitTime")]
    pub wait_time_ms: u64,
}

/// One waiting entry in [`QueueStatus`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedDownload {
    pub download_id: DownloadId,
    pub position: usize,
    #[serde(rename = "waitTime")]
    pub wait_time_ms: u64,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
}

/// Queue overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_length: usize,
    pub max_queue_size: usize,
    pub active_downloads: usize,
    pub max_concurrent: usize,
    pub queued_downloads: Vec<QueuedDownload>,
}

struct Waiting {
    id: DownloadId,
    enqueued_at: Instant,
    meta: DownloadMeta,
    admit: oneshot::Sender<CancellationToken>,
}

struct Active {
    started_at: Instant,
    cancel: CancellationToken,
}

#[derive(Default)]
struct QueueState {
    queued: VecDeque<Waiting>,
    active: HashMap<DownloadId, Active>,
    history: VecDeque<Duration>,
}

impl QueueState {
    fn contains(&self, id: DownloadId) -> bool {
        self.active.contains_key(&id) || self.queued.iter().any(|w| w.id == id)
    }

    fn average_service_time(&self, seed: Duration) -> Duration {
        if self.history.is_empty() {
            return seed;
        }
        let total: Duration = self.history.iter().sum();
        total / self.history.len() as u32
    }

    fn record(&mut self, elapsed: Duration, window: usize) {
        self.history.push_back(elapsed);
        while self.history.len() > window {
            self.history.pop_front();
        }
    }

    /// Move waiting entries into free slots. Entries whose waiter is gone
    /// are dropped on the way.
    fn promote(&mut self, max_concurrent: usize) {
        while self.active.len() < max_concurrent {
            let Some(next) = self.queued.pop_front() else {
                break;
            };
            let cancel = CancellationToken::new();
            if next.admit.send(cancel.clone()).is_err() {
                debug!(download_id = %next.id, "Skipping abandoned queue entry");
                continue;
            }
            debug!(download_id = %next.id, "Promoted queued download");
            self.active.insert(
                next.id,
                Active {
                    started_at: Instant::now(),
                    cancel,
                },
            );
        }
    }
}

/// Process-wide admission controller.
///
/// Cloning is cheap and every clone shares one state. The lock is never
/// held across an await point.
#[derive(Clone)]
pub struct DownloadQueue {
    state: Arc<Mutex<QueueState>>,
    config: Arc<DownloadQueueConfig>,
}

impl std::fmt::Debug for DownloadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DownloadQueue")
            .field("active", &state.active.len())
            .field("queued", &state.queued.len())
            .field("max_concurrent", &self.config.max_concurrent)
            .finish()
    }
}

impl DownloadQueue {
    pub fn new(config: DownloadQueueConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DownloadQueueConfig {
        &self.config
    }

    /// Whether a transfer of `size` bytes skips admission control.
    pub fn bypasses(&self, size: u64) -> bool {
        size < self.config.min_file_size_bytes
    }

    /// Admit or enqueue a transfer.
    ///
    /// Fails with `QueueFull` when every slot is taken and the queue is at
    /// capacity, and with `Conflict` when `id` is already tracked.
    pub fn enqueue(&self, id: DownloadId, meta: DownloadMeta) -> AppResult<Enqueued> {
        if meta.file_size.is_some_and(|size| self.bypasses(size)) {
            debug!(download_id = %id, "Download bypasses the queue");
            return Ok(Enqueued::Admitted(ActivePermit::untracked(id)));
        }

        let mut state = self.state.lock();
        if state.contains(id) {
            return Err(AppError::conflict("Download is already in progress"));
        }

        if state.active.len() < self.config.max_concurrent && state.queued.is_empty() {
            let cancel = CancellationToken::new();
            state.active.insert(
                id,
                Active {
                    started_at: Instant::now(),
                    cancel: cancel.clone(),
                },
            );
            debug!(download_id = %id, active = state.active.len(), "Download admitted");
            return Ok(Enqueued::Admitted(ActivePermit::tracked(
                self.clone(),
                id,
                cancel,
            )));
        }

        if state.queued.len() >= self.config.max_queue_size {
            warn!(
                download_id = %id,
                queued = state.queued.len(),
                "Download queue is full"
            );
            return Err(AppError::queue_full("Download queue is full"));
        }

        let (admit, rx) = oneshot::channel();
        state.queued.push_back(Waiting {
            id,
            enqueued_at: Instant::now(),
            meta,
            admit,
        });
        let position = state.queued.len();
        let wait_time = self.estimate(&state, position);
        info!(download_id = %id, position, "Download queued");

        Ok(Enqueued::Queued {
            position,
            wait_time,
            waiter: QueueWaiter::new(self.clone(), id, rx),
        })
    }

    /// Suspending form of [`enqueue`](Self::enqueue): resolves once the
    /// transfer holds a slot.
    pub async fn acquire(&self, id: DownloadId, meta: DownloadMeta) -> AppResult<ActivePermit> {
        match self.enqueue(id, meta)? {
            Enqueued::Admitted(permit) => Ok(permit),
            Enqueued::Queued { waiter, .. } => waiter.admitted().await,
        }
    }

    /// Position and estimated wait of one download.
    pub fn status(&self, id: DownloadId) -> AppResult<DownloadStatus> {
        let state = self.state.lock();
        if state.active.contains_key(&id) {
            return Ok(DownloadStatus {
                download_id: id,
                state: DownloadState::Active,
                position: 0,
                wait_time_ms: 0,
            });
        }
        let index = state
            .queued
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| AppError::not_found("Download not found in queue"))?;
        let position = index + 1;
        Ok(DownloadStatus {
            download_id: id,
            state: DownloadState::Queued,
            position,
            wait_time_ms: millis(self.estimate(&state, position)),
        })
    }

    /// Overview of the whole queue.
    pub fn queue_status(&self) -> QueueStatus {
        let state = self.state.lock();
        let queued_downloads = state
            .queued
            .iter()
            .enumerate()
            .map(|(index, w)| QueuedDownload {
                download_id: w.id,
                position: index + 1,
                wait_time_ms: millis(self.estimate(&state, index + 1)),
                file_name: w.meta.file_name.clone(),
                file_size: w.meta.file_size,
            })
            .collect();
        QueueStatus {
            queue_length: state.queued.len(),
            max_queue_size: self.config.max_queue_size,
            active_downloads: state.active.len(),
            max_concurrent: self.config.max_concurrent,
            queued_downloads,
        }
    }

    /// Remove a download wherever it is. Cancelling an active transfer
    /// fires its token and frees its slot. Returns whether anything was
    /// removed; unknown ids are a no-op.
    pub fn cancel(&self, id: DownloadId) -> bool {
        let mut state = self.state.lock();
        if let Some(index) = state.queued.iter().position(|w| w.id == id) {
            state.queued.remove(index);
            info!(download_id = %id, "Queued download cancelled");
            return true;
        }
        if let Some(active) = state.active.remove(&id) {
            active.cancel.cancel();
            state.promote(self.config.max_concurrent);
            info!(download_id = %id, "Active download cancelled");
            return true;
        }
        false
    }

    /// Reject every waiting entry. Active transfers are left alone.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let cleared = state.queued.len();
        state.queued.clear();
        if cleared > 0 {
            info!(cleared, "Download queue cleared");
        }
        cleared
    }

    /// Free the slot of a finished transfer and record its service time.
    pub(crate) fn release(&self, id: DownloadId) {
        let mut state = self.state.lock();
        let Some(active) = state.active.remove(&id) else {
            return;
        };
        let elapsed = active.started_at.elapsed();
        state.record(elapsed, self.config.history_window);
        state.promote(self.config.max_concurrent);
        debug!(download_id = %id, elapsed_ms = millis(elapsed), "Download finished");
    }

    /// Force-release abandoned transfers and reject stale waiters.
    /// Returns `(released, rejected)`.
    pub fn cleanup_stale(&self) -> (usize, usize) {
        let now = Instant::now();
        let stale_active = self.config.stale_active();
        let stale_queued = self.config.stale_queued();

        let mut state = self.state.lock();
        let expired: Vec<DownloadId> = state
            .active
            .iter()
            .filter(|(_, a)| now.duration_since(a.started_at) > stale_active)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(active) = state.active.remove(id) {
                active.cancel.cancel();
                warn!(download_id = %id, "Releasing stale active download");
            }
        }

        let before = state.queued.len();
        state.queued.retain(|w| {
            let stale = now.duration_since(w.enqueued_at) > stale_queued;
            if stale {
                warn!(download_id = %w.id, "Download timed out in queue");
            }
            !stale
        });
        let rejected = before - state.queued.len();

        state.promote(self.config.max_concurrent);
        (expired.len(), rejected)
    }

    /// Run [`cleanup_stale`](Self::cleanup_stale) on a fixed interval until
    /// `shutdown` fires.
    pub fn spawn_cleanup(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let queue = self.clone();
        let period = self.config.cleanup_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let (released, rejected) = queue.cleanup_stale();
                        if released + rejected > 0 {
                            info!(released, rejected, "Download queue cleanup");
                        }
                    }
                }
            }
            debug!("Download queue cleanup stopped");
        })
    }

    fn estimate(&self, state: &QueueState, position: usize) -> Duration {
        state.average_service_time(self.config.default_service_time()) * position as u32
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

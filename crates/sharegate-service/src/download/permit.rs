//! Handles returned by the admission queue.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use sharegate_core::error::AppError;
use sharegate_core::result::AppResult;
use sharegate_core::types::id::DownloadId;

use super::queue::DownloadQueue;

/// A held transfer slot. Dropping it frees the slot and promotes the next
/// waiter.
pub struct ActivePermit {
    queue: Option<DownloadQueue>,
    id: DownloadId,
    cancel: CancellationToken,
}

impl ActivePermit {
    pub(crate) fn tracked(queue: DownloadQueue, id: DownloadId, cancel: CancellationToken) -> Self {
        Self {
            queue: Some(queue),
            id,
            cancel,
        }
    }

    /// Permit for a transfer that bypassed the queue.
    pub(crate) fn untracked(id: DownloadId) -> Self {
        Self {
            queue: None,
            id,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> DownloadId {
        self.id
    }

    /// Fires when the transfer is cancelled or swept as stale. The
    /// streaming side stops as soon as it observes this.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether this transfer counts against the concurrency ceiling.
    pub fn is_tracked(&self) -> bool {
        self.queue.is_some()
    }
}

impl Drop for ActivePermit {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.release(self.id);
        }
    }
}

impl std::fmt::Debug for ActivePermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivePermit")
            .field("id", &self.id)
            .field("tracked", &self.is_tracked())
            .finish()
    }
}

/// A queued transfer waiting for a slot. Dropping it before admission
/// removes the entry from the queue.
pub struct QueueWaiter {
    queue: DownloadQueue,
    id: DownloadId,
    rx: Option<oneshot::Receiver<CancellationToken>>,
}

impl QueueWaiter {
    pub(crate) fn new(
        queue: DownloadQueue,
        id: DownloadId,
        rx: oneshot::Receiver<CancellationToken>,
    ) -> Self {
        Self {
            queue,
            id,
            rx: Some(rx),
        }
    }

    pub fn id(&self) -> DownloadId {
        self.id
    }

    /// Wait for promotion. Fails with `Cancelled` when the entry is
    /// cancelled, cleared, or times out in the queue.
    pub async fn admitted(mut self) -> AppResult<ActivePermit> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(AppError::cancelled("Download was cancelled"));
        };
        let outcome = rx.await;
        self.rx = None;
        match outcome {
            Ok(cancel) => Ok(ActivePermit::tracked(self.queue.clone(), self.id, cancel)),
            Err(_) => Err(AppError::cancelled("Download was cancelled")),
        }
    }
}

impl Drop for QueueWaiter {
    fn drop(&mut self) {
        // Abandoned before admission resolved. If promotion already
        // happened this frees the slot instead.
        if self.rx.is_some() {
            self.queue.cancel(self.id);
        }
    }
}

impl std::fmt::Debug for QueueWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueWaiter").field("id", &self.id).finish()
    }
}

//! Admission control for outbound transfers.
//!
//! At most `max_concurrent` transfers run at once; up to `max_queue_size`
//! more wait in FIFO order. Transfers of objects below
//! `min_file_size_bytes` never enter the queue.

pub mod permit;
pub mod queue;

pub use permit::{ActivePermit, QueueWaiter};
pub use queue::{DownloadMeta, DownloadQueue, DownloadState, DownloadStatus, Enqueued, QueueStatus, QueuedDownload};

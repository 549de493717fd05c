//! Object store collaborator trait.
//!
//! Sharegate never implements storage itself: it asks the object store to
//! presign transfers, probe its own health, copy objects server-side, and
//! report object sizes. Implementations live in `sharegate-storage`.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// A byte stream type used for streaming object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Direction of a presigned transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transfer {
    /// A single PUT of the object body.
    Upload,
    /// A single GET of the object body.
    Download,
}

/// Operations Sharegate consumes from the object store.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Produce a URL that authorizes exactly one transfer of `object`
    /// until `ttl` elapses.
    async fn presign(&self, object: &str, transfer: Transfer, ttl: Duration) -> AppResult<String>;

    /// Check that the backend is reachable. Callers bound this with their
    /// own timeout.
    async fn health_check(&self) -> AppResult<()>;

    /// Server-side copy. The destination only becomes visible once the
    /// copy has fully succeeded.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()>;

    /// Size of an existing object in bytes, or `NotFound`.
    async fn head_object(&self, object: &str) -> AppResult<u64>;

    /// Remove an object. Removing a missing object succeeds.
    async fn delete(&self, object: &str) -> AppResult<()>;
}

//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use sharegate_auth::password::PasswordHasher;
use sharegate_auth::token::TokenIssuer;
use sharegate_core::config::TokenConfig;
use sharegate_core::error::AppError;
use sharegate_core::events::EventBus;
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::{ObjectStore, Transfer};
use sharegate_database::Repositories;

use crate::access::AccessResolver;

/// Object store keeping sizes only, with injectable latency and failures.
#[derive(Debug, Default)]
pub struct FakeStore {
    objects: Mutex<HashMap<String, u64>>,
    pub probe_delay: Mutex<Option<Duration>>,
    pub copy_delay: Mutex<Option<Duration>>,
    pub fail_copy: AtomicBool,
    pub fail_delete: AtomicBool,
    pub copies_started: AtomicUsize,
    pub deletes_attempted: AtomicUsize,
}

impl FakeStore {
    pub fn put(&self, object: &str, size: u64) {
        self.objects.lock().insert(object.to_string(), size);
    }

    pub fn contains(&self, object: &str) -> bool {
        self.objects.lock().contains_key(object)
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    fn provider_type(&self) -> &str {
        "fake"
    }

    async fn presign(&self, object: &str, transfer: Transfer, _ttl: Duration) -> AppResult<String> {
        Ok(format!("fake://{transfer:?}/{object}"))
    }

    async fn health_check(&self) -> AppResult<()> {
        let delay = *self.probe_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        self.copies_started.fetch_add(1, Ordering::SeqCst);
        let delay = *self.copy_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(AppError::storage("copy failed"));
        }
        let size = self
            .objects
            .lock()
            .get(from)
            .copied()
            .ok_or_else(|| AppError::not_found("Source object not found"))?;
        self.put(to, size);
        Ok(())
    }

    async fn head_object(&self, object: &str) -> AppResult<u64> {
        self.objects
            .lock()
            .get(object)
            .copied()
            .ok_or_else(|| AppError::not_found("Object not found"))
    }

    async fn delete(&self, object: &str) -> AppResult<()> {
        self.deletes_attempted.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::storage("delete failed"));
        }
        self.objects.lock().remove(object);
        Ok(())
    }
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new("service-test-token-secret")
}

pub fn resolver(repos: &Repositories, store: std::sync::Arc<FakeStore>) -> AccessResolver {
    AccessResolver::new(
        repos.clone(),
        store,
        issuer(),
        PasswordHasher::new(),
        TokenConfig::default(),
        EventBus::default(),
    )
}

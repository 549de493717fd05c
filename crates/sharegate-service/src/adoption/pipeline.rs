//! Probe, guarded copy, commit.
//!
//! The liveness probe and the copy run under two independent timers. A
//! copy that misses its deadline is dropped (which aborts it), the record
//! moves to `failed`, and the source object is never touched.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{error, info, warn};
use uuid::Uuid;

use sharegate_core::config::{AdoptionConfig, LibraryConfig};
use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::events::{AdoptionEvent, EventBus, EventPayload};
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::ObjectStore;
use sharegate_database::Repositories;
use sharegate_entity::file::{CreateFile, File, library_object_name};
use sharegate_entity::reverse_share::{AdoptionState, ReverseShareFile};

use crate::context::RequestContext;
use crate::file::StorageQuota;

/// Runs adoptions. Each call is independent; the in-flight set only keeps
/// two attempts on the same object from overlapping.
#[derive(Debug, Clone)]
pub struct AdoptionPipeline {
    repos: Repositories,
    store: Arc<dyn ObjectStore>,
    config: AdoptionConfig,
    quota: StorageQuota,
    events: EventBus,
    in_flight: Arc<DashMap<String, Uuid>>,
}

/// Removes the object from the in-flight set when the attempt ends.
struct InFlight {
    set: Arc<DashMap<String, Uuid>>,
    object_name: String,
}

impl InFlight {
    fn claim(set: &Arc<DashMap<String, Uuid>>, file: &ReverseShareFile) -> AppResult<Self> {
        match set.entry(file.object_name.clone()) {
            Entry::Occupied(_) => {
                Err(AppError::conflict("Adoption already in progress for this file"))
            }
            Entry::Vacant(slot) => {
                slot.insert(file.id);
                Ok(Self {
                    set: set.clone(),
                    object_name: file.object_name.clone(),
                })
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.remove(&self.object_name);
    }
}

impl AdoptionPipeline {
    pub fn new(
        repos: Repositories,
        store: Arc<dyn ObjectStore>,
        config: AdoptionConfig,
        limits: LibraryConfig,
        events: EventBus,
    ) -> Self {
        Self {
            quota: StorageQuota::new(repos.clone(), limits),
            repos,
            store,
            config,
            events,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Copy an uploaded file into the caller's library.
    ///
    /// Only the reverse share's owner may adopt, and only within the library
    /// limits. A `failed` file is retried as a fresh attempt on a new pending
    /// record. The attempt runs in its own task so a dropped caller cannot
    /// abandon it between copy and commit.
    pub async fn adopt(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = self
            .repos
            .reverse_shares
            .find_file(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        let reverse_share = self
            .repos
            .reverse_shares
            .find_by_id(file.reverse_share_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reverse share not found"))?;
        if !ctx.owns(reverse_share.owner_id) {
            return Err(AppError::forbidden(
                "Only the reverse share owner can copy its files",
            ));
        }

        let guard = InFlight::claim(&self.in_flight, &file)?;
        if file.adoption_state == AdoptionState::Adopted {
            return Err(AppError::conflict("File has already been copied"));
        }
        self.quota.check(ctx.owner_id(), file.size).await?;

        let file = if file.adoption_state == AdoptionState::Failed {
            info!(file_id = %file.id, "Retrying failed adoption");
            self.repos.reverse_shares.reset_failed(file.id).await?
        } else {
            file
        };

        let pipeline = self.clone();
        let owner_id = ctx.owner_id();
        let task = tokio::spawn(async move {
            let _guard = guard;
            pipeline.run(file, owner_id).await
        });
        task.await
            .map_err(|e| AppError::internal(format!("Adoption task failed: {e}")))?
    }

    async fn run(&self, file: ReverseShareFile, owner_id: Uuid) -> AppResult<File> {
        let destination = library_object_name(owner_id, &file.name, &file.extension, Utc::now());

        match self.transfer(&file, &destination).await {
            Ok(()) => self.commit(&file, owner_id, destination).await,
            Err(e) => {
                self.fail(&file, &e).await;
                Err(e)
            }
        }
    }

    async fn transfer(&self, file: &ReverseShareFile, destination: &str) -> AppResult<()> {
        match tokio::time::timeout(self.config.probe_timeout(), self.store.health_check()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(AppError::with_source(
                    ErrorKind::BackendUnavailable,
                    "Storage backend is unavailable",
                    e,
                ));
            }
            Err(_) => {
                return Err(AppError::backend_unavailable(
                    "Storage backend did not answer the liveness probe in time",
                ));
            }
        }

        let deadline = self.config.copy_deadline();
        match tokio::time::timeout(deadline, self.store.copy(&file.object_name, destination)).await
        {
            Ok(result) => result,
            Err(_) => {
                // The copy may have landed partially on the destination side.
                if let Err(e) = self.store.delete(destination).await {
                    warn!(object = %destination, error = %e, "Failed to remove partial copy");
                }
                Err(AppError::copy_timeout(format!(
                    "Copy did not finish within {}s",
                    deadline.as_secs()
                )))
            }
        }
    }

    async fn commit(
        &self,
        file: &ReverseShareFile,
        owner_id: Uuid,
        destination: String,
    ) -> AppResult<File> {
        let library_file = CreateFile {
            name: file.name.clone(),
            extension: file.extension.clone(),
            size: file.size,
            object_name: destination,
            owner_id,
        };

        match self
            .repos
            .reverse_shares
            .commit_adoption(file.id, &library_file)
            .await
        {
            Ok(adopted) => {
                info!(
                    reverse_share_file_id = %file.id,
                    library_file_id = %adopted.id,
                    size = file.size,
                    "File adopted"
                );
                self.events.publish(
                    Some(owner_id),
                    EventPayload::Adoption(AdoptionEvent::Adopted {
                        reverse_share_file_id: file.id,
                        library_file_id: adopted.id,
                    }),
                );
                Ok(adopted)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&library_file.object_name).await {
                    warn!(
                        object = %library_file.object_name,
                        error = %cleanup,
                        "Failed to remove uncommitted copy"
                    );
                }
                self.fail(file, &e).await;
                Err(e)
            }
        }
    }

    async fn fail(&self, file: &ReverseShareFile, cause: &AppError) {
        warn!(
            reverse_share_file_id = %file.id,
            kind = ?cause.kind,
            error = %cause,
            "Adoption failed"
        );
        match self.repos.reverse_shares.mark_failed(file.id).await {
            Ok(true) => {}
            Ok(false) => warn!(reverse_share_file_id = %file.id, "File was no longer pending"),
            Err(e) => error!(reverse_share_file_id = %file.id, error = %e, "Failed to record adoption failure"),
        }
        self.events.publish(
            None,
            EventPayload::Adoption(AdoptionEvent::Failed {
                reverse_share_file_id: file.id,
                reason: cause.message.clone(),
            }),
        );
    }
}

//! The owner's permanent file library.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use sharegate_core::config::{LibraryConfig, TokenConfig};
use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::{ObjectStore, Transfer};
use sharegate_database::Repositories;
use sharegate_entity::file::{CreateFile, File, library_object_name, split_file_name};

use crate::context::RequestContext;
use crate::reverse_share::DownloadHandle;

use super::quota::StorageQuota;

/// Library uploads, registration, listing and removal.
#[derive(Debug, Clone)]
pub struct LibraryService {
    repos: Repositories,
    store: Arc<dyn ObjectStore>,
    tokens: TokenConfig,
    quota: StorageQuota,
}

/// Request for a presigned upload into the caller's library.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryUploadRequest {
    pub file_name: String,
}

/// Where to upload, and the object name to register afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryUploadGrant {
    pub object_name: String,
    pub upload_url: String,
}

/// Registration of an object uploaded through a [`LibraryUploadGrant`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFileRequest {
    pub object_name: String,
    /// Display name including extension.
    pub file_name: String,
}

impl LibraryService {
    pub fn new(
        repos: Repositories,
        store: Arc<dyn ObjectStore>,
        tokens: TokenConfig,
        limits: LibraryConfig,
    ) -> Self {
        Self {
            quota: StorageQuota::new(repos.clone(), limits),
            repos,
            store,
            tokens,
        }
    }

    /// Presign an upload under the caller's prefix.
    pub async fn authorize_upload(
        &self,
        ctx: &RequestContext,
        req: &LibraryUploadRequest,
    ) -> AppResult<LibraryUploadGrant> {
        let (name, extension) = split_file_name(&req.file_name);
        if name.is_empty() {
            return Err(AppError::validation("File name must not be empty"));
        }
        let object_name = library_object_name(ctx.owner_id(), &name, &extension, Utc::now());
        let upload_url = self
            .store
            .presign(&object_name, Transfer::Upload, self.tokens.upload_ttl())
            .await?;
        Ok(LibraryUploadGrant {
            object_name,
            upload_url,
        })
    }

    /// Record an uploaded object. The size comes from the store and must
    /// fit the library limits.
    pub async fn register(&self, ctx: &RequestContext, req: &RegisterFileRequest) -> AppResult<File> {
        let prefix = format!("{}/", ctx.owner_id());
        if !req.object_name.starts_with(&prefix) {
            return Err(AppError::forbidden("Object is outside your library"));
        }
        let (name, extension) = split_file_name(&req.file_name);
        if name.is_empty() {
            return Err(AppError::validation("File name must not be empty"));
        }

        let size = self
            .store
            .head_object(&req.object_name)
            .await
            .map_err(|e| match e.kind {
                ErrorKind::NotFound => AppError::validation("Uploaded object not found"),
                _ => e,
            })?;
        let size = i64::try_from(size)
            .map_err(|_| AppError::validation("Uploaded object is too large"))?;
        self.quota.check(ctx.owner_id(), size).await?;

        let file = self
            .repos
            .files
            .create(&CreateFile {
                name,
                extension,
                size,
                object_name: req.object_name.clone(),
                owner_id: ctx.owner_id(),
            })
            .await?;
        info!(user_id = %ctx.user_id, file_id = %file.id, size, "Library file registered");
        Ok(file)
    }

    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<File>> {
        self.repos.files.list_by_owner(ctx.owner_id()).await
    }

    pub async fn download_url(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<DownloadHandle> {
        let file = self.owned(ctx, file_id).await?;
        let ttl = self.tokens.download_ttl();
        let url = self
            .store
            .presign(&file.object_name, Transfer::Download, ttl)
            .await?;
        Ok(DownloadHandle {
            url,
            expires_in: ttl.as_secs(),
        })
    }

    /// Delete the object and its record. Shares referencing the file
    /// drop it.
    pub async fn delete(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let file = self.owned(ctx, file_id).await?;
        self.store.delete(&file.object_name).await?;
        self.repos.files.delete(file_id).await?;
        info!(user_id = %ctx.user_id, file_id = %file_id, "Library file deleted");
        Ok(())
    }

    async fn owned(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        self.repos
            .files
            .find_by_id(file_id)
            .await?
            .filter(|file| ctx.owns(file.owner_id))
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}

//! Reverse share CRUD service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use sharegate_auth::password::PasswordHasher;
use sharegate_core::config::TokenConfig;
use sharegate_core::error::AppError;
use sharegate_core::events::{EventBus, EventPayload, ReverseShareEvent};
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::{ObjectStore, Transfer};
use sharegate_database::Repositories;
use sharegate_entity::Alias;
use sharegate_entity::reverse_share::{
    CreateReverseShare, ReverseShare, ReverseShareAlias, ReverseShareFile, UpdateReverseShare,
};

use crate::context::RequestContext;
use crate::patch::nullable;

/// Manages reverse shares and the files uploaded to them on behalf of
/// their owner. Anything owned by someone else is reported as missing.
#[derive(Debug, Clone)]
pub struct ReverseShareService {
    repos: Repositories,
    store: Arc<dyn ObjectStore>,
    hasher: PasswordHasher,
    tokens: TokenConfig,
    events: EventBus,
}

/// Request to create a reverse share.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReverseShareRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub max_files: Option<i32>,
    pub max_file_size: Option<i64>,
    /// Comma-separated extensions, e.g. `"pdf,png"`.
    pub allowed_file_types: Option<String>,
    pub password: Option<String>,
    pub alias: Option<String>,
}

/// Request to update a reverse share. Absent fields are left alone;
/// `null` clears a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReverseShareRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub expiration: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_files: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_file_size: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub allowed_file_types: Option<Option<String>>,
}

/// A reverse share as its owner sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseShareDetails {
    #[serde(flatten)]
    pub reverse_share: ReverseShare,
    pub has_password: bool,
    pub alias: Option<String>,
    pub file_count: usize,
}

/// Short-lived download handle for an uploaded file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadHandle {
    pub url: String,
    pub expires_in: u64,
}

impl ReverseShareService {
    pub fn new(
        repos: Repositories,
        store: Arc<dyn ObjectStore>,
        hasher: PasswordHasher,
        tokens: TokenConfig,
        events: EventBus,
    ) -> Self {
        Self {
            repos,
            store,
            hasher,
            tokens,
            events,
        }
    }

    pub async fn list_reverse_shares(
        &self,
        ctx: &RequestContext,
    ) -> AppResult<Vec<ReverseShareDetails>> {
        let reverse_shares = self
            .repos
            .reverse_shares
            .list_by_owner(ctx.owner_id())
            .await?;
        let mut details = Vec::with_capacity(reverse_shares.len());
        for reverse_share in reverse_shares {
            details.push(self.details(reverse_share).await?);
        }
        Ok(details)
    }

    /// Creates an active reverse share.
    pub async fn create_reverse_share(
        &self,
        ctx: &RequestContext,
        req: CreateReverseShareRequest,
    ) -> AppResult<ReverseShareDetails> {
        if req.expiration.is_some_and(|e| e <= Utc::now()) {
            return Err(AppError::validation("Expiration must be in the future"));
        }
        validate_limits(req.max_files, req.max_file_size)?;
        let alias = match req.alias.as_deref() {
            Some(raw) => Alias::parse(raw)?,
            None => Alias::generate(),
        };
        let password_hash = match req.password.as_deref() {
            Some(password) => Some(self.hash(password)?),
            None => None,
        };

        let data = CreateReverseShare {
            name: req.name,
            description: req.description,
            expiration: req.expiration,
            max_files: req.max_files,
            max_file_size: req.max_file_size,
            allowed_file_types: req.allowed_file_types,
            password_hash,
            owner_id: ctx.owner_id(),
        };
        let reverse_share = self.repos.reverse_shares.create(&data, &alias).await?;

        info!(
            user_id = %ctx.user_id,
            reverse_share_id = %reverse_share.id,
            alias = %alias,
            "Reverse share created"
        );
        self.details(reverse_share).await
    }

    pub async fn get_reverse_share(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> AppResult<ReverseShareDetails> {
        let reverse_share = self.owned(ctx, id).await?;
        self.details(reverse_share).await
    }

    pub async fn update_reverse_share(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateReverseShareRequest,
    ) -> AppResult<ReverseShareDetails> {
        self.owned(ctx, id).await?;
        validate_limits(req.max_files.flatten(), req.max_file_size.flatten())?;

        let changes = UpdateReverseShare {
            name: req.name,
            description: req.description,
            expiration: req.expiration,
            max_files: req.max_files,
            max_file_size: req.max_file_size,
            allowed_file_types: req.allowed_file_types,
            is_active: None,
        };
        let reverse_share = self.repos.reverse_shares.update(id, &changes).await?;
        info!(user_id = %ctx.user_id, reverse_share_id = %id, "Reverse share updated");
        self.details(reverse_share).await
    }

    /// Deletes the reverse share, its file records and their uploaded
    /// objects. Library copies of adopted files are separate objects and
    /// survive.
    pub async fn delete_reverse_share(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        self.owned(ctx, id).await?;
        let files = self.repos.reverse_shares.list_files(id).await?;
        for file in &files {
            if let Err(e) = self.store.delete(&file.object_name).await {
                warn!(
                    reverse_share_id = %id,
                    object = %file.object_name,
                    error = %e,
                    "Failed to delete uploaded object"
                );
            }
        }
        self.repos.reverse_shares.delete(id).await?;

        info!(
            user_id = %ctx.user_id,
            reverse_share_id = %id,
            files = files.len(),
            "Reverse share deleted"
        );
        Ok(())
    }

    /// Sets or clears the upload password.
    pub async fn update_password(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        password: Option<&str>,
    ) -> AppResult<()> {
        self.owned(ctx, id).await?;
        let hash = match password {
            Some(password) => Some(self.hash(password)?),
            None => None,
        };
        self.repos
            .reverse_shares
            .set_password_hash(id, hash.as_deref())
            .await?;
        info!(
            user_id = %ctx.user_id,
            reverse_share_id = %id,
            protected = hash.is_some(),
            "Reverse share password updated"
        );
        Ok(())
    }

    pub async fn activate(&self, ctx: &RequestContext, id: Uuid) -> AppResult<ReverseShareDetails> {
        self.set_active(ctx, id, true).await
    }

    pub async fn deactivate(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> AppResult<ReverseShareDetails> {
        self.set_active(ctx, id, false).await
    }

    /// Points `alias` at the reverse share, replacing its previous alias.
    pub async fn set_alias(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        alias: &str,
    ) -> AppResult<ReverseShareAlias> {
        self.owned(ctx, id).await?;
        let alias = Alias::parse(alias)?;
        let assigned = self.repos.reverse_shares.set_alias(id, &alias).await?;
        info!(user_id = %ctx.user_id, reverse_share_id = %id, alias = %alias, "Reverse share alias set");
        Ok(assigned)
    }

    /// Files uploaded to the reverse share, oldest first.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> AppResult<Vec<ReverseShareFile>> {
        self.owned(ctx, id).await?;
        self.repos.reverse_shares.list_files(id).await
    }

    /// Renames an uploaded file. The extension never changes; a trailing
    /// copy of it in `name` is dropped.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        name: &str,
    ) -> AppResult<ReverseShareFile> {
        let file = self.owned_file(ctx, file_id).await?;
        let name = name.trim();
        let suffix = format!(".{}", file.extension);
        let stem = match name.len().checked_sub(suffix.len()) {
            Some(cut)
                if !file.extension.is_empty()
                    && cut > 0
                    && name.is_char_boundary(cut)
                    && name[cut..].eq_ignore_ascii_case(&suffix) =>
            {
                &name[..cut]
            }
            _ => name,
        };
        if stem.is_empty() {
            return Err(AppError::validation("File name must not be empty"));
        }
        self.repos.reverse_shares.rename_file(file_id, stem).await
    }

    /// Deletes an uploaded file and its object.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let file = self.owned_file(ctx, file_id).await?;
        self.store.delete(&file.object_name).await?;
        self.repos.reverse_shares.delete_file(file_id).await?;

        info!(
            user_id = %ctx.user_id,
            reverse_share_id = %file.reverse_share_id,
            file_id = %file_id,
            "Uploaded file deleted"
        );
        self.events.publish(
            Some(ctx.owner_id()),
            EventPayload::ReverseShare(ReverseShareEvent::FileDeleted {
                reverse_share_id: file.reverse_share_id,
                file_id,
            }),
        );
        Ok(())
    }

    /// Presigned download of an uploaded file for the owner.
    pub async fn download_url(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<DownloadHandle> {
        let file = self.owned_file(ctx, file_id).await?;
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

    async fn set_active(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        active: bool,
    ) -> AppResult<ReverseShareDetails> {
        self.owned(ctx, id).await?;
        let changes = UpdateReverseShare {
            is_active: Some(active),
            ..Default::default()
        };
        let reverse_share = self.repos.reverse_shares.update(id, &changes).await?;
        info!(user_id = %ctx.user_id, reverse_share_id = %id, active, "Reverse share toggled");
        self.details(reverse_share).await
    }

    async fn owned(&self, ctx: &RequestContext, id: Uuid) -> AppResult<ReverseShare> {
        self.repos
            .reverse_shares
            .find_by_id(id)
            .await?
            .filter(|rs| ctx.owns(rs.owner_id))
            .ok_or_else(|| AppError::not_found("Reverse share not found"))
    }

    async fn owned_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<ReverseShareFile> {
        let file = self
            .repos
            .reverse_shares
            .find_file(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        self.owned(ctx, file.reverse_share_id)
            .await
            .map_err(|_| AppError::not_found("File not found"))?;
        Ok(file)
    }

    async fn details(&self, reverse_share: ReverseShare) -> AppResult<ReverseShareDetails> {
        let alias = self
            .repos
            .reverse_shares
            .alias_of(reverse_share.id)
            .await?
            .map(|a| a.alias);
        let file_count = self
            .repos
            .reverse_shares
            .list_files(reverse_share.id)
            .await?
            .len();
        Ok(ReverseShareDetails {
            has_password: reverse_share.has_password(),
            reverse_share,
            alias,
            file_count,
        })
    }

    fn hash(&self, password: &str) -> AppResult<String> {
        if password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        self.hasher.hash_password(password)
    }
}

fn validate_limits(max_files: Option<i32>, max_file_size: Option<i64>) -> AppResult<()> {
    if max_files.is_some_and(|n| n < 1) {
        return Err(AppError::validation("Max files must be at least 1"));
    }
    if max_file_size.is_some_and(|n| n < 1) {
        return Err(AppError::validation("Max file size must be at least 1 byte"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sharegate_core::error::ErrorKind;
    use sharegate_core::types::UserId;
    use sharegate_entity::reverse_share::NewReverseShareFile;

    use super::*;
    use crate::testing::FakeStore;

    struct Fixture {
        repos: Repositories,
        store: Arc<FakeStore>,
        service: ReverseShareService,
        owner: RequestContext,
    }

    fn fixture() -> Fixture {
        let repos = Repositories::memory();
        let store = Arc::new(FakeStore::default());
        let service = ReverseShareService::new(
            repos.clone(),
            store.clone(),
            PasswordHasher::new(),
            TokenConfig::default(),
            EventBus::default(),
        );
        Fixture {
            repos,
            store,
            service,
            owner: RequestContext::new(UserId::new()),
        }
    }

    async fn upload(f: &Fixture, reverse_share_id: Uuid, name: &str) -> ReverseShareFile {
        let object_name = format!("reverse-shares/{reverse_share_id}/{name}.pdf");
        f.store.put(&object_name, 100);
        f.repos
            .reverse_shares
            .register_file(
                &NewReverseShareFile {
                    reverse_share_id,
                    name: name.into(),
                    extension: "pdf".into(),
                    size: 100,
                    object_name,
                    uploader_name: None,
                    uploader_email: None,
                },
                None,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_get_and_toggle() {
        let f = fixture();
        let created = f
            .service
            .create_reverse_share(
                &f.owner,
                CreateReverseShareRequest {
                    name: Some("Inbox".into()),
                    alias: Some("drop-here".into()),
                    password: Some("pw".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(created.reverse_share.is_active);
        assert!(created.has_password);
        assert_eq!(created.alias.as_deref(), Some("drop-here"));

        let id = created.reverse_share.id;
        let off = f.service.deactivate(&f.owner, id).await.unwrap();
        assert!(!off.reverse_share.is_active);
        let on = f.service.activate(&f.owner, id).await.unwrap();
        assert!(on.reverse_share.is_active);

        let stranger = RequestContext::new(UserId::new());
        let err = f.service.get_reverse_share(&stranger, id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_limits_are_validated() {
        let f = fixture();
        let err = f
            .service
            .create_reverse_share(
                &f.owner,
                CreateReverseShareRequest {
                    max_files: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_rename_keeps_extension() {
        let f = fixture();
        let rs = f
            .service
            .create_reverse_share(&f.owner, CreateReverseShareRequest::default())
            .await
            .unwrap();
        let file = upload(&f, rs.reverse_share.id, "scan").await;

        let renamed = f.service.rename_file(&f.owner, file.id, "invoice.PDF").await.unwrap();
        assert_eq!(renamed.name, "invoice");
        assert_eq!(renamed.extension, "pdf");
        let renamed = f.service.rename_file(&f.owner, file.id, "notes.txt").await.unwrap();
        assert_eq!(renamed.file_name(), "notes.txt.pdf");
    }

    #[tokio::test]
    async fn test_delete_file_removes_object() {
        let f = fixture();
        let rs = f
            .service
            .create_reverse_share(&f.owner, CreateReverseShareRequest::default())
            .await
            .unwrap();
        let file = upload(&f, rs.reverse_share.id, "scan").await;

        let handle = f.service.download_url(&f.owner, file.id).await.unwrap();
        assert!(handle.url.contains(&file.object_name));

        let stranger = RequestContext::new(UserId::new());
        let err = f.service.delete_file(&stranger, file.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        f.service.delete_file(&f.owner, file.id).await.unwrap();
        assert!(!f.store.contains(&file.object_name));
        assert!(f.service.list_files(&f.owner, rs.reverse_share.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reverse_share_removes_uploads() {
        let f = fixture();
        let rs = f
            .service
            .create_reverse_share(&f.owner, CreateReverseShareRequest::default())
            .await
            .unwrap();
        let a = upload(&f, rs.reverse_share.id, "a").await;
        let b = upload(&f, rs.reverse_share.id, "b").await;
        assert_eq!(
            f.service.get_reverse_share(&f.owner, rs.reverse_share.id).await.unwrap().file_count,
            2
        );

        f.service.delete_reverse_share(&f.owner, rs.reverse_share.id).await.unwrap();
        assert!(!f.store.contains(&a.object_name));
        assert!(!f.store.contains(&b.object_name));
        assert!(f.repos.reverse_shares.find_file(a.id).await.unwrap().is_none());
    }
}

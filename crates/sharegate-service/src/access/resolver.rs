//! Anonymous access to shares and reverse shares by alias.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use sharegate_auth::password::PasswordHasher;
use sharegate_auth::token::{TokenIssuer, TokenOperation, registration_resource};
use sharegate_core::config::TokenConfig;
use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::events::{EventBus, EventPayload, ReverseShareEvent, ShareEvent};
use sharegate_core::result::AppResult;
use sharegate_core::traits::storage::{ObjectStore, Transfer};
use sharegate_database::Repositories;
use sharegate_entity::file::{File, sanitize, split_file_name};
use sharegate_entity::reverse_share::{NewReverseShareFile, ReverseShare, ReverseShareFile};
use sharegate_entity::share::Share;

use super::gate::{Gated, unlock};

/// A library file exposed by a resolved share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFile {
    /// The library file.
    #[serde(flatten)]
    pub file: File,
    /// Presigned download handle.
    pub download_url: String,
}

/// Outcome of a successful share resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedShare {
    /// The share, with the view just counted.
    pub share: Share,
    /// Files in share order, each with a fresh download handle.
    pub files: Vec<SharedFile>,
}

/// What an anonymous uploader may know about a reverse share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseShareInfo {
    /// Reverse share ID.
    pub id: Uuid,
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Expiration, if any.
    pub expiration: Option<DateTime<Utc>>,
    /// Per-file size ceiling in bytes.
    pub max_file_size: Option<i64>,
    /// Accepted extensions, comma-separated.
    pub allowed_file_types: Option<String>,
    /// Uploads still accepted before `max_files` is reached.
    pub remaining_files: Option<i64>,
}

/// An uploader's request for a presigned PUT.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Original file name including extension.
    pub file_name: String,
    /// Declared size in bytes.
    pub size: i64,
}

/// Presigned upload target plus the token that authorizes registering it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    /// Object the upload will create.
    pub object_name: String,
    /// Presigned PUT URL.
    pub upload_url: String,
    /// Token for the register-file call.
    pub registration_token: String,
}

/// Registration of a completed upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUpload {
    /// Token from the upload grant.
    pub registration_token: String,
    /// Display name; defaults to the uploaded object's name.
    pub file_name: Option<String>,
    /// Optional uploader name.
    pub uploader_name: Option<String>,
    /// Optional uploader email.
    pub uploader_email: Option<String>,
}

/// Resolves aliases through the access state machine and hands out
/// presigned handles once access is granted.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    repos: Repositories,
    store: Arc<dyn ObjectStore>,
    issuer: TokenIssuer,
    hasher: PasswordHasher,
    tokens: TokenConfig,
    events: EventBus,
}

impl AccessResolver {
    /// Creates a new access resolver.
    pub fn new(
        repos: Repositories,
        store: Arc<dyn ObjectStore>,
        issuer: TokenIssuer,
        hasher: PasswordHasher,
        tokens: TokenConfig,
        events: EventBus,
    ) -> Self {
        Self {
            repos,
            store,
            issuer,
            hasher,
            tokens,
            events,
        }
    }

    /// Resolve a share alias. On success one view is counted and every
    /// requested file (all files when `file_ids` is `None`) gets a
    /// download handle.
    pub async fn resolve_share(
        &self,
        alias: &str,
        password: Option<&str>,
        file_ids: Option<&[Uuid]>,
    ) -> AppResult<ResolvedShare> {
        let found = self.repos.shares.find_by_alias(alias).await?;
        let mut share = unlock(found, password, &self.hasher, Utc::now(), "Share not found").await?;

        // The gate saw a snapshot; the conditional increment decides races
        // at the last view.
        let views = self
            .repos
            .shares
            .try_increment_views(share.id)
            .await?
            .ok_or_else(|| AppError::view_limit_reached("Share has reached its view limit"))?;
        share.views = views;

        let ordered = self.repos.shares.file_ids(share.id).await?;
        let wanted: Vec<Uuid> = match file_ids {
            Some(requested) => ordered
                .into_iter()
                .filter(|id| requested.contains(id))
                .collect(),
            None => ordered,
        };
        let mut found = self.repos.files.find_many(&wanted).await?;
        found.sort_by_key(|f| wanted.iter().position(|id| *id == f.id));

        let mut files = Vec::with_capacity(found.len());
        for file in found {
            let download_url = self
                .store
                .presign(&file.object_name, Transfer::Download, self.tokens.download_ttl())
                .await?;
            files.push(SharedFile { file, download_url });
        }

        info!(share_id = %share.id, views, files = files.len(), "Share resolved");
        self.events.publish(
            None,
            EventPayload::Share(ShareEvent::Resolved {
                share_id: share.id,
                views,
            }),
        );

        Ok(ResolvedShare { share, files })
    }

    /// Unlock a reverse share and describe what it accepts.
    pub async fn open_reverse_share(
        &self,
        alias: &str,
        password: Option<&str>,
    ) -> AppResult<ReverseShareInfo> {
        let reverse_share = self.unlock_reverse_share(alias, password).await?;
        let remaining_files = self.remaining_files(&reverse_share).await?;

        Ok(ReverseShareInfo {
            id: reverse_share.id,
            name: reverse_share.name,
            description: reverse_share.description,
            expiration: reverse_share.expiration,
            max_file_size: reverse_share.max_file_size,
            allowed_file_types: reverse_share.allowed_file_types,
            remaining_files,
        })
    }

    /// Unlock a reverse share and authorize one upload to it.
    pub async fn authorize_upload(
        &self,
        alias: &str,
        password: Option<&str>,
        request: &UploadRequest,
    ) -> AppResult<UploadGrant> {
        let reverse_share = self.unlock_reverse_share(alias, password).await?;

        let (stem, extension) = split_file_name(&request.file_name);
        if stem.is_empty() {
            return Err(AppError::validation("File name is required"));
        }
        check_limits(&reverse_share, &extension, request.size)?;
        if self.remaining_files(&reverse_share).await? == Some(0) {
            return Err(AppError::validation("Maximum number of files reached"));
        }

        let object_name = upload_object_name(reverse_share.id, &stem, &extension);
        let upload_url = self
            .store
            .presign(&object_name, Transfer::Upload, self.tokens.upload_ttl())
            .await?;
        let registration_token = self.issuer.issue(
            &registration_resource(reverse_share.id, &object_name),
            TokenOperation::Register,
            self.tokens.registration_ttl(),
        )?;

        info!(reverse_share_id = %reverse_share.id, object = %object_name, "Upload authorized");
        Ok(UploadGrant {
            object_name,
            upload_url,
            registration_token,
        })
    }

    /// Register a completed upload. The registration token is the proof
    /// that the password was verified when the upload was authorized.
    pub async fn register_upload(
        &self,
        alias: &str,
        request: &RegisterUpload,
    ) -> AppResult<ReverseShareFile> {
        let grant = self
            .issuer
            .validate_for(&request.registration_token, TokenOperation::Register)?;
        let (reverse_share_id, object_name) = grant
            .registration_parts()
            .ok_or_else(|| AppError::malformed("Invalid token"))?;

        let reverse_share = self
            .repos
            .reverse_shares
            .find_by_alias(alias)
            .await?
            .ok_or_else(|| AppError::not_found("Reverse share not found"))?;
        if reverse_share.id != reverse_share_id {
            warn!(alias, "Registration token presented to a different reverse share");
            return Err(AppError::operation_mismatch("Invalid token"));
        }
        reverse_share.check_gate(Utc::now())?;

        let size = self.store.head_object(object_name).await.map_err(|e| {
            if e.kind == ErrorKind::NotFound {
                AppError::validation("Uploaded object not found")
            } else {
                e
            }
        })?;
        let size = i64::try_from(size).unwrap_or(i64::MAX);

        let display_name = request
            .file_name
            .clone()
            .unwrap_or_else(|| uploaded_file_name(object_name));
        let (name, extension) = split_file_name(&display_name);
        if let Err(e) = check_limits(&reverse_share, &extension, size) {
            self.store.delete(object_name).await?;
            return Err(e);
        }

        let file = self
            .repos
            .reverse_shares
            .register_file(
                &NewReverseShareFile {
                    reverse_share_id,
                    name,
                    extension,
                    size,
                    object_name: object_name.to_string(),
                    uploader_name: request.uploader_name.clone(),
                    uploader_email: request.uploader_email.clone(),
                },
                reverse_share.max_files,
            )
            .await?;

        info!(
            reverse_share_id = %reverse_share_id,
            file_id = %file.id,
            size,
            "Reverse share file registered"
        );
        self.events.publish(
            None,
            EventPayload::ReverseShare(ReverseShareEvent::FileRegistered {
                reverse_share_id,
                file_id: file.id,
                object_name: file.object_name.clone(),
                size,
            }),
        );
        Ok(file)
    }

    async fn unlock_reverse_share(
        &self,
        alias: &str,
        password: Option<&str>,
    ) -> AppResult<ReverseShare> {
        let found = self.repos.reverse_shares.find_by_alias(alias).await?;
        unlock(found, password, &self.hasher, Utc::now(), "Reverse share not found").await
    }

    async fn remaining_files(&self, reverse_share: &ReverseShare) -> AppResult<Option<i64>> {
        let Some(max) = reverse_share.max_files else {
            return Ok(None);
        };
        let used = self.repos.reverse_shares.list_files(reverse_share.id).await?.len() as i64;
        Ok(Some((i64::from(max) - used).max(0)))
    }
}

fn check_limits(reverse_share: &ReverseShare, extension: &str, size: i64) -> AppResult<()> {
    if size < 0 {
        return Err(AppError::validation("File size must not be negative"));
    }
    if !reverse_share.allows_extension(extension) {
        return Err(AppError::validation(format!(
            "File type .{extension} is not accepted"
        )));
    }
    if !reverse_share.allows_size(size) {
        return Err(AppError::validation("File exceeds the maximum size"));
    }
    Ok(())
}

/// `reverse-shares/{id}/{random}-{stem}[.{ext}]`
fn upload_object_name(reverse_share_id: Uuid, stem: &str, extension: &str) -> String {
    let prefix = Uuid::new_v4().simple().to_string();
    let stem = sanitize(stem);
    let extension = sanitize(extension);
    if extension.is_empty() {
        format!("reverse-shares/{reverse_share_id}/{}-{stem}", &prefix[..12])
    } else {
        format!("reverse-shares/{reverse_share_id}/{}-{stem}.{extension}", &prefix[..12])
    }
}

/// Recover the uploader's file name from an object created by
/// [`upload_object_name`].
fn uploaded_file_name(object_name: &str) -> String {
    let last = object_name.rsplit('/').next().unwrap_or(object_name);
    match last.split_once('-') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => last.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use sharegate_entity::Alias;
    use sharegate_entity::file::CreateFile;
    use sharegate_entity::reverse_share::CreateReverseShare;
    use sharegate_entity::share::CreateShare;

    use super::*;
    use crate::testing::{FakeStore, resolver};

    #[test]
    fn test_upload_object_name_round_trips_file_name() {
        let id = Uuid::new_v4();
        let object = upload_object_name(id, "tax return", "pdf");
        assert!(object.starts_with(&format!("reverse-shares/{id}/")));
        assert_eq!(uploaded_file_name(&object), "tax_return.pdf");

        let object = upload_object_name(id, "Makefile", "");
        assert_eq!(uploaded_file_name(&object), "Makefile");
    }

    async fn share_with(
        repos: &Repositories,
        alias: &str,
        password: Option<&str>,
        max_views: Option<i32>,
    ) -> Share {
        let owner = Uuid::new_v4();
        let file = repos
            .files
            .create(&CreateFile {
                name: "report".into(),
                extension: "pdf".into(),
                size: 10,
                object_name: format!("{owner}/1-report.pdf"),
                owner_id: owner,
            })
            .await
            .unwrap();
        let password_hash = password.map(|p| PasswordHasher::new().hash_password(p).unwrap());
        repos
            .shares
            .create(
                &CreateShare {
                    name: None,
                    description: None,
                    expiration: None,
                    max_views,
                    password_hash,
                    owner_id: owner,
                },
                &[file.id],
                &[],
                &Alias::parse(alias).unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_password_then_view_limit_scenario() {
        let repos = Repositories::memory();
        let resolver = resolver(&repos, Arc::new(FakeStore::default()));
        let share = share_with(&repos, "s1-share", Some("secret"), Some(1)).await;

        let err = resolver
            .resolve_share("s1-share", Some("nope"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPassword);
        let stored = repos.shares.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(stored.views, 0);

        let resolved = resolver
            .resolve_share("s1-share", Some("secret"), None)
            .await
            .unwrap();
        assert_eq!(resolved.share.views, 1);
        assert_eq!(resolved.files.len(), 1);
        assert!(resolved.files[0].download_url.starts_with("fake://Download/"));

        let err = resolver
            .resolve_share("s1-share", Some("secret"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ViewLimitReached);
    }

    #[tokio::test]
    async fn test_racing_resolutions_never_exceed_max_views() {
        let repos = Repositories::memory();
        let resolver = resolver(&repos, Arc::new(FakeStore::default()));
        let share = share_with(&repos, "racy", None, Some(3)).await;

        let mut handles = Vec::new();
        for _ in 0..12 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver.resolve_share("racy", None, None).await
            }));
        }
        let mut granted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => granted += 1,
                Err(e) => assert_eq!(e.kind, ErrorKind::ViewLimitReached),
            }
        }
        assert_eq!(granted, 3);
        let stored = repos.shares.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(stored.views, 3);
    }

    #[tokio::test]
    async fn test_file_subset_keeps_share_order() {
        let repos = Repositories::memory();
        let resolver = resolver(&repos, Arc::new(FakeStore::default()));
        let share = share_with(&repos, "subset", None, None).await;
        let first = repos.shares.file_ids(share.id).await.unwrap()[0];

        let resolved = resolver
            .resolve_share("subset", None, Some(&[Uuid::new_v4()][..]))
            .await
            .unwrap();
        assert!(resolved.files.is_empty());

        let resolved = resolver
            .resolve_share("subset", None, Some(&[first][..]))
            .await
            .unwrap();
        assert_eq!(resolved.files[0].file.id, first);
    }

    async fn reverse_share_with(repos: &Repositories, alias: &str) -> ReverseShare {
        repos
            .reverse_shares
            .create(
                &CreateReverseShare {
                    name: Some("Inbox".into()),
                    description: None,
                    expiration: None,
                    max_files: Some(1),
                    max_file_size: Some(1_000),
                    allowed_file_types: Some("pdf, .png".into()),
                    password_hash: None,
                    owner_id: Uuid::new_v4(),
                },
                &Alias::parse(alias).unwrap(),
            )
            .await
            .unwrap()
    }

    fn upload(file_name: &str, size: i64) -> UploadRequest {
        UploadRequest {
            file_name: file_name.into(),
            size,
        }
    }

    fn register(token: &str) -> RegisterUpload {
        RegisterUpload {
            registration_token: token.into(),
            file_name: None,
            uploader_name: Some("Ana".into()),
            uploader_email: None,
        }
    }

    #[tokio::test]
    async fn test_upload_then_register() {
        let repos = Repositories::memory();
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(&repos, store.clone());
        let rs = reverse_share_with(&repos, "inbox").await;

        let info = resolver.open_reverse_share("inbox", None).await.unwrap();
        assert_eq!(info.remaining_files, Some(1));

        let grant = resolver
            .authorize_upload("inbox", None, &upload("Scan.PDF", 500))
            .await
            .unwrap();
        assert!(grant.upload_url.starts_with("fake://Upload/reverse-shares/"));

        // Registering before the PUT landed fails.
        let err = resolver
            .register_upload("inbox", &register(&grant.registration_token))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        store.put(&grant.object_name, 500);
        let file = resolver
            .register_upload("inbox", &register(&grant.registration_token))
            .await
            .unwrap();
        assert_eq!(file.reverse_share_id, rs.id);
        assert_eq!(file.name, "Scan");
        assert_eq!(file.extension, "pdf");
        assert_eq!(file.size, 500);

        let err = resolver
            .authorize_upload("inbox", None, &upload("more.pdf", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_registration_token_registers_once() {
        let repos = Repositories::memory();
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(&repos, store.clone());
        let rs = reverse_share_with(&repos, "once").await;

        let grant = resolver
            .authorize_upload("once", None, &upload("a.pdf", 10))
            .await
            .unwrap();
        store.put(&grant.object_name, 10);

        resolver
            .register_upload("once", &register(&grant.registration_token))
            .await
            .unwrap();
        for _ in 0..2 {
            let err = resolver
                .register_upload("once", &register(&grant.registration_token))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Conflict);
        }
        assert_eq!(repos.reverse_shares.list_files(rs.id).await.unwrap().len(), 1);
        assert!(store.contains(&grant.object_name));
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let repos = Repositories::memory();
        let resolver = resolver(&repos, Arc::new(FakeStore::default()));
        reverse_share_with(&repos, "limits").await;

        for request in [upload("virus.exe", 10), upload("big.png", 5_000)] {
            let err = resolver
                .authorize_upload("limits", None, &request)
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_stored_size_is_rechecked_at_registration() {
        let repos = Repositories::memory();
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(&repos, store.clone());
        reverse_share_with(&repos, "liar").await;

        let grant = resolver
            .authorize_upload("liar", None, &upload("small.pdf", 10))
            .await
            .unwrap();
        store.put(&grant.object_name, 50_000);

        let err = resolver
            .register_upload("liar", &register(&grant.registration_token))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(!store.contains(&grant.object_name));
    }

    #[tokio::test]
    async fn test_registration_token_is_bound_to_its_reverse_share() {
        let repos = Repositories::memory();
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(&repos, store.clone());
        reverse_share_with(&repos, "first").await;
        reverse_share_with(&repos, "second").await;

        let grant = resolver
            .authorize_upload("first", None, &upload("a.pdf", 10))
            .await
            .unwrap();
        store.put(&grant.object_name, 10);

        let err = resolver
            .register_upload("second", &register(&grant.registration_token))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OperationMismatch);

        let err = resolver
            .register_upload("first", &register("garbage"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn test_deactivated_reverse_share_rejects_registration() {
        let repos = Repositories::memory();
        let store = Arc::new(FakeStore::default());
        let resolver = resolver(&repos, store.clone());
        let rs = reverse_share_with(&repos, "closing").await;

        let grant = resolver
            .authorize_upload("closing", None, &upload("a.pdf", 10))
            .await
            .unwrap();
        store.put(&grant.object_name, 10);
        repos
            .reverse_shares
            .update(
                rs.id,
                &sharegate_entity::reverse_share::UpdateReverseShare {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = resolver
            .register_upload("closing", &register(&grant.registration_token))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}

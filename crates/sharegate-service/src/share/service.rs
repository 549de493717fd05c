//! Share CRUD service.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::ValidateEmail;

use sharegate_auth::password::PasswordHasher;
use sharegate_core::error::AppError;
use sharegate_core::events::{EventBus, EventPayload, ShareEvent};
use sharegate_core::result::AppResult;
use sharegate_database::Repositories;
use sharegate_entity::Alias;
use sharegate_entity::share::{CreateShare, Share, ShareAlias, UpdateShare};

use crate::context::RequestContext;
use crate::patch::nullable;

/// Manages shares on behalf of their owner. Shares owned by someone else
/// are reported as missing.
#[derive(Debug, Clone)]
pub struct ShareService {
    repos: Repositories,
    hasher: PasswordHasher,
    events: EventBus,
}

/// Request to create a new share.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub password: Option<String>,
    /// Library files in display order.
    #[serde(default)]
    pub file_ids: Vec<Uuid>,
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Generated when absent.
    pub alias: Option<String>,
}

/// Request to update an existing share. Absent fields are left alone;
/// `null` clears a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShareRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub expiration: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_views: Option<Option<i32>>,
}

/// A share as its owner sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDetails {
    #[serde(flatten)]
    pub share: Share,
    pub has_password: bool,
    pub alias: Option<String>,
    pub file_ids: Vec<Uuid>,
    pub recipients: Vec<String>,
}

/// Outcome of a recipient notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedRecipients {
    pub notified_recipients: Vec<String>,
}

impl ShareService {
    pub fn new(repos: Repositories, hasher: PasswordHasher, events: EventBus) -> Self {
        Self {
            repos,
            hasher,
            events,
        }
    }

    /// Lists shares created by the current user, newest first.
    pub async fn list_shares(&self, ctx: &RequestContext) -> AppResult<Vec<ShareDetails>> {
        let shares = self.repos.shares.list_by_owner(ctx.owner_id()).await?;
        let mut details = Vec::with_capacity(shares.len());
        for share in shares {
            details.push(self.details(share).await?);
        }
        Ok(details)
    }

    /// Creates a share over files the caller owns.
    pub async fn create_share(
        &self,
        ctx: &RequestContext,
        req: CreateShareRequest,
    ) -> AppResult<ShareDetails> {
        validate_limits(req.expiration, req.max_views, Utc::now())?;
        self.ensure_owns_files(ctx, &req.file_ids).await?;
        let recipients = normalize_recipients(&req.recipients)?;
        let alias = match req.alias.as_deref() {
            Some(raw) => Alias::parse(raw)?,
            None => Alias::generate(),
        };
        let password_hash = match req.password.as_deref() {
            Some(password) => Some(self.hash(password)?),
            None => None,
        };

        let data = CreateShare {
            name: req.name,
            description: req.description,
            expiration: req.expiration,
            max_views: req.max_views,
            password_hash,
            owner_id: ctx.owner_id(),
        };
        let share = self
            .repos
            .shares
            .create(&data, &req.file_ids, &recipients, &alias)
            .await?;

        info!(
            user_id = %ctx.user_id,
            share_id = %share.id,
            alias = %alias,
            file_count = req.file_ids.len(),
            "Share created"
        );
        self.events.publish(
            Some(ctx.owner_id()),
            EventPayload::Share(ShareEvent::Created {
                share_id: share.id,
                file_count: req.file_ids.len(),
            }),
        );

        self.details(share).await
    }

    /// Gets one of the caller's shares. No view is counted.
    pub async fn get_share(&self, ctx: &RequestContext, share_id: Uuid) -> AppResult<ShareDetails> {
        let share = self.owned(ctx, share_id).await?;
        self.details(share).await
    }

    /// Updates a share.
    pub async fn update_share(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        req: UpdateShareRequest,
    ) -> AppResult<ShareDetails> {
        self.owned(ctx, share_id).await?;
        if let Some(Some(max_views)) = req.max_views {
            validate_limits(None, Some(max_views), Utc::now())?;
        }

        let changes = UpdateShare {
            name: req.name,
            description: req.description,
            expiration: req.expiration,
            max_views: req.max_views,
        };
        let share = self.repos.shares.update(share_id, &changes).await?;

        info!(user_id = %ctx.user_id, share_id = %share_id, "Share updated");
        self.details(share).await
    }

    /// Deletes a share with its alias, links and recipients. Library files
    /// are untouched.
    pub async fn delete_share(&self, ctx: &RequestContext, share_id: Uuid) -> AppResult<()> {
        self.owned(ctx, share_id).await?;
        self.repos.shares.delete(share_id).await?;

        info!(user_id = %ctx.user_id, share_id = %share_id, "Share deleted");
        self.events.publish(
            Some(ctx.owner_id()),
            EventPayload::Share(ShareEvent::Deleted { share_id }),
        );
        Ok(())
    }

    /// Sets or clears the password.
    pub async fn update_password(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        password: Option<&str>,
    ) -> AppResult<()> {
        self.owned(ctx, share_id).await?;
        let hash = match password {
            Some(password) => Some(self.hash(password)?),
            None => None,
        };
        self.repos
            .shares
            .set_password_hash(share_id, hash.as_deref())
            .await?;

        info!(
            user_id = %ctx.user_id,
            share_id = %share_id,
            protected = hash.is_some(),
            "Share password updated"
        );
        Ok(())
    }

    /// Appends files the caller owns.
    pub async fn add_files(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        file_ids: &[Uuid],
    ) -> AppResult<ShareDetails> {
        let share = self.owned(ctx, share_id).await?;
        self.ensure_owns_files(ctx, file_ids).await?;
        self.repos.shares.add_files(share_id, file_ids).await?;
        self.details(share).await
    }

    pub async fn remove_files(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        file_ids: &[Uuid],
    ) -> AppResult<ShareDetails> {
        let share = self.owned(ctx, share_id).await?;
        self.repos.shares.remove_files(share_id, file_ids).await?;
        self.details(share).await
    }

    /// Adds recipients. Addresses are lower-cased and deduplicated.
    pub async fn add_recipients(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        emails: &[String],
    ) -> AppResult<ShareDetails> {
        let share = self.owned(ctx, share_id).await?;
        let emails = normalize_recipients(emails)?;
        self.repos.shares.add_recipients(share_id, &emails).await?;
        self.details(share).await
    }

    pub async fn remove_recipients(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        emails: &[String],
    ) -> AppResult<ShareDetails> {
        let share = self.owned(ctx, share_id).await?;
        let emails: Vec<String> = emails.iter().map(|e| e.trim().to_lowercase()).collect();
        self.repos.shares.remove_recipients(share_id, &emails).await?;
        self.details(share).await
    }

    /// Announce `link` to every recipient of the share.
    pub async fn notify_recipients(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        link: &str,
    ) -> AppResult<NotifiedRecipients> {
        let share = self.owned(ctx, share_id).await?;
        let recipients = self.repos.shares.recipients(share_id).await?;
        if recipients.is_empty() {
            return Err(AppError::validation("No recipients found for this share"));
        }

        info!(
            user_id = %ctx.user_id,
            share_id = %share_id,
            count = recipients.len(),
            "Share recipients notified"
        );
        self.events.publish(
            Some(ctx.owner_id()),
            EventPayload::Share(ShareEvent::RecipientsNotified {
                share_id,
                share_name: share.name,
                link: link.to_string(),
                recipients: recipients.clone(),
            }),
        );
        Ok(NotifiedRecipients {
            notified_recipients: recipients,
        })
    }

    /// Points `alias` at the share, replacing its previous alias.
    pub async fn set_alias(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        alias: &str,
    ) -> AppResult<ShareAlias> {
        self.owned(ctx, share_id).await?;
        let alias = Alias::parse(alias)?;
        let assigned = self.repos.shares.set_alias(share_id, &alias).await?;
        info!(user_id = %ctx.user_id, share_id = %share_id, alias = %alias, "Share alias set");
        Ok(assigned)
    }

    async fn owned(&self, ctx: &RequestContext, share_id: Uuid) -> AppResult<Share> {
        self.repos
            .shares
            .find_by_id(share_id)
            .await?
            .filter(|share| ctx.owns(share.owner_id))
            .ok_or_else(|| AppError::not_found("Share not found"))
    }

    async fn ensure_owns_files(&self, ctx: &RequestContext, file_ids: &[Uuid]) -> AppResult<()> {
        if file_ids.is_empty() {
            return Ok(());
        }
        let wanted: BTreeSet<Uuid> = file_ids.iter().copied().collect();
        let ids: Vec<Uuid> = wanted.iter().copied().collect();
        let owned = self
            .repos
            .files
            .find_many(&ids)
            .await?
            .into_iter()
            .filter(|file| ctx.owns(file.owner_id))
            .count();
        if owned != wanted.len() {
            return Err(AppError::validation("One or more files were not found"));
        }
        Ok(())
    }

    async fn details(&self, share: Share) -> AppResult<ShareDetails> {
        let alias = self.repos.shares.alias_of(share.id).await?.map(|a| a.alias);
        let file_ids = self.repos.shares.file_ids(share.id).await?;
        let recipients = self.repos.shares.recipients(share.id).await?;
        Ok(ShareDetails {
            has_password: share.has_password(),
            share,
            alias,
            file_ids,
            recipients,
        })
    }

    fn hash(&self, password: &str) -> AppResult<String> {
        if password.is_empty() {
            return Err(AppError::validation("Password must not be empty"));
        }
        self.hasher.hash_password(password)
    }
}

fn validate_limits(
    expiration: Option<DateTime<Utc>>,
    max_views: Option<i32>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if expiration.is_some_and(|expiration| expiration <= now) {
        return Err(AppError::validation("Expiration must be in the future"));
    }
    if max_views.is_some_and(|max| max < 1) {
        return Err(AppError::validation("Max views must be at least 1"));
    }
    Ok(())
}

/// Lower-case, validate and deduplicate recipient addresses.
pub(crate) fn normalize_recipients(emails: &[String]) -> AppResult<Vec<String>> {
    let mut unique = BTreeSet::new();
    for email in emails {
        let email = email.trim().to_lowercase();
        if !email.validate_email() {
            return Err(AppError::validation(format!(
                "Invalid recipient email: {email}"
            )));
        }
        unique.insert(email);
    }
    Ok(unique.into_iter().collect())
}

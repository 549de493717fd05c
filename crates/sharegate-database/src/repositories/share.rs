//! Share repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::result::AppResult;
use sharegate_entity::Alias;
use sharegate_entity::share::{CreateShare, Share, ShareAlias, UpdateShare};

use super::db_error;

/// Persistence for shares, their ordered files, recipients and alias.
#[async_trait]
pub trait ShareStore: Send + Sync + std::fmt::Debug {
    /// Insert a share together with its files, recipients and alias.
    /// Fails with `Conflict` when the alias is taken.
    async fn create(
        &self,
        data: &CreateShare,
        file_ids: &[Uuid],
        recipients: &[String],
        alias: &Alias,
    ) -> AppResult<Share>;

    /// Find a share by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>>;

    /// Find the share an alias points to.
    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<Share>>;

    /// List shares owned by a user, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Share>>;

    /// Apply owner edits.
    async fn update(&self, id: Uuid, changes: &UpdateShare) -> AppResult<Share>;

    /// Set or clear the password hash.
    async fn set_password_hash(&self, id: Uuid, hash: Option<&str>) -> AppResult<()>;

    /// Delete a share and everything hanging off it.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Count one view unless the limit is already reached. Returns the new
    /// count, or `None` when the limit blocked the increment. Concurrent
    /// callers at `views = max_views - 1` see exactly one success.
    async fn try_increment_views(&self, id: Uuid) -> AppResult<Option<i32>>;

    /// File IDs of a share in display order.
    async fn file_ids(&self, share_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Append files, ignoring ones already present.
    async fn add_files(&self, share_id: Uuid, file_ids: &[Uuid]) -> AppResult<()>;

    /// Remove files from the share.
    async fn remove_files(&self, share_id: Uuid, file_ids: &[Uuid]) -> AppResult<()>;

    /// Recipient emails, sorted.
    async fn recipients(&self, share_id: Uuid) -> AppResult<Vec<String>>;

    /// Add recipients, ignoring duplicates.
    async fn add_recipients(&self, share_id: Uuid, emails: &[String]) -> AppResult<()>;

    /// Remove recipients.
    async fn remove_recipients(&self, share_id: Uuid, emails: &[String]) -> AppResult<()>;

    /// The share's current alias.
    async fn alias_of(&self, share_id: Uuid) -> AppResult<Option<ShareAlias>>;

    /// Point `alias` at the share, replacing its previous alias. Fails with
    /// `Conflict` when another share holds the alias.
    async fn set_alias(&self, share_id: Uuid, alias: &Alias) -> AppResult<ShareAlias>;
}

/// PostgreSQL implementation of [`ShareStore`].
#[derive(Debug, Clone)]
pub struct PgShareRepository {
    pool: PgPool,
}

impl PgShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn alias_error(e: sqlx::Error) -> AppError {
    let err = db_error("Failed to assign alias")(e);
    if err.kind == ErrorKind::Conflict {
        AppError::conflict("Alias already in use")
    } else {
        err
    }
}

#[async_trait]
impl ShareStore for PgShareRepository {
    async fn create(
        &self,
        data: &CreateShare,
        file_ids: &[Uuid],
        recipients: &[String],
        alias: &Alias,
    ) -> AppResult<Share> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let share = sqlx::query_as::<_, Share>(
            "INSERT INTO shares (id, name, description, expiration, max_views, views, \
             password_hash, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 0, $6, $7, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.expiration)
        .bind(data.max_views)
        .bind(&data.password_hash)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create share"))?;

        for (position, file_id) in file_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO share_files (share_id, file_id, position) VALUES ($1, $2, $3) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(share.id)
            .bind(file_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to attach file"))?;
        }

        for email in recipients {
            sqlx::query(
                "INSERT INTO share_recipients (share_id, email) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(share.id)
            .bind(email)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to add recipient"))?;
        }

        sqlx::query("INSERT INTO share_aliases (alias, share_id) VALUES ($1, $2)")
            .bind(alias.as_str())
            .bind(share.id)
            .execute(&mut *tx)
            .await
            .map_err(alias_error)?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit share"))?;
        Ok(share)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find share"))
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT s.* FROM shares s JOIN share_aliases a ON a.share_id = s.id WHERE a.alias = $1",
        )
        .bind(alias)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find share by alias"))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list shares"))
    }

    async fn update(&self, id: Uuid, changes: &UpdateShare) -> AppResult<Share> {
        let mut share = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Share not found"))?;
        changes.apply_to(&mut share);

        sqlx::query_as::<_, Share>(
            "UPDATE shares SET name = $2, description = $3, expiration = $4, max_views = $5, \
             updated_at = $6 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&share.name)
        .bind(&share.description)
        .bind(share.expiration)
        .bind(share.max_views)
        .bind(share.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to update share"))
    }

    async fn set_password_hash(&self, id: Uuid, hash: Option<&str>) -> AppResult<()> {
        sqlx::query("UPDATE shares SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update share password"))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM shares WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete share"))?;
        Ok(())
    }

    async fn try_increment_views(&self, id: Uuid) -> AppResult<Option<i32>> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE shares SET views = views + 1 \
             WHERE id = $1 AND (max_views IS NULL OR views < max_views) RETURNING views",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to count share view"))
    }

    async fn file_ids(&self, share_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT file_id FROM share_files WHERE share_id = $1 ORDER BY position",
        )
        .bind(share_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list share files"))
    }

    async fn add_files(&self, share_id: Uuid, file_ids: &[Uuid]) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO share_files (share_id, file_id, position) \
             SELECT $1, f.id, \
                    (SELECT COALESCE(MAX(position), -1) FROM share_files WHERE share_id = $1) + f.ord \
             FROM UNNEST($2::uuid[]) WITH ORDINALITY AS f(id, ord) \
             ON CONFLICT DO NOTHING",
        )
        .bind(share_id)
        .bind(file_ids)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to add share files"))?;
        Ok(())
    }

    async fn remove_files(&self, share_id: Uuid, file_ids: &[Uuid]) -> AppResult<()> {
        sqlx::query("DELETE FROM share_files WHERE share_id = $1 AND file_id = ANY($2)")
            .bind(share_id)
            .bind(file_ids)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to remove share files"))?;
        Ok(())
    }

    async fn recipients(&self, share_id: Uuid) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT email FROM share_recipients WHERE share_id = $1 ORDER BY email",
        )
        .bind(share_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list recipients"))
    }

    async fn add_recipients(&self, share_id: Uuid, emails: &[String]) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO share_recipients (share_id, email) \
             SELECT $1, e FROM UNNEST($2::text[]) AS e ON CONFLICT DO NOTHING",
        )
        .bind(share_id)
        .bind(emails)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to add recipients"))?;
        Ok(())
    }

    async fn remove_recipients(&self, share_id: Uuid, emails: &[String]) -> AppResult<()> {
        sqlx::query("DELETE FROM share_recipients WHERE share_id = $1 AND email = ANY($2)")
            .bind(share_id)
            .bind(emails)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to remove recipients"))?;
        Ok(())
    }

    async fn alias_of(&self, share_id: Uuid) -> AppResult<Option<ShareAlias>> {
        sqlx::query_as::<_, ShareAlias>("SELECT * FROM share_aliases WHERE share_id = $1")
            .bind(share_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find share alias"))
    }

    async fn set_alias(&self, share_id: Uuid, alias: &Alias) -> AppResult<ShareAlias> {
        sqlx::query_as::<_, ShareAlias>(
            "INSERT INTO share_aliases (alias, share_id, created_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (share_id) DO UPDATE SET alias = EXCLUDED.alias, created_at = NOW() \
             RETURNING *",
        )
        .bind(alias.as_str())
        .bind(share_id)
        .fetch_one(&self.pool)
        .await
        .map_err(alias_error)
    }
}

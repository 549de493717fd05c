//! Reverse share repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::result::AppResult;
use sharegate_entity::Alias;
use sharegate_entity::file::{CreateFile, File};
use sharegate_entity::reverse_share::{
    AdoptionState, CreateReverseShare, NewReverseShareFile, ReverseShare, ReverseShareAlias,
    ReverseShareFile, UpdateReverseShare,
};

use super::db_error;

/// Persistence for reverse shares, their aliases and uploaded files.
#[async_trait]
pub trait ReverseShareStore: Send + Sync + std::fmt::Debug {
    /// Insert a reverse share with its alias. Fails with `Conflict` when
    /// the alias is taken.
    async fn create(&self, data: &CreateReverseShare, alias: &Alias) -> AppResult<ReverseShare>;

    /// Find a reverse share by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReverseShare>>;

    /// Find the reverse share an alias points to.
    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<ReverseShare>>;

    /// List reverse shares owned by a user, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<ReverseShare>>;

    /// Apply owner edits.
    async fn update(&self, id: Uuid, changes: &UpdateReverseShare) -> AppResult<ReverseShare>;

    /// Set or clear the password hash.
    async fn set_password_hash(&self, id: Uuid, hash: Option<&str>) -> AppResult<()>;

    /// Delete a reverse share and its file records.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// The reverse share's current alias.
    async fn alias_of(&self, reverse_share_id: Uuid) -> AppResult<Option<ReverseShareAlias>>;

    /// Point `alias` at the reverse share, replacing its previous alias.
    async fn set_alias(&self, reverse_share_id: Uuid, alias: &Alias)
    -> AppResult<ReverseShareAlias>;

    /// Register an uploaded object as `pending`. With `max_files` set, the
    /// count check and insert are atomic and a full share fails with
    /// `Validation`.
    async fn register_file(
        &self,
        file: &NewReverseShareFile,
        max_files: Option<i32>,
    ) -> AppResult<ReverseShareFile>;

    /// Find an uploaded file by ID.
    async fn find_file(&self, id: Uuid) -> AppResult<Option<ReverseShareFile>>;

    /// Files registered against a reverse share, oldest first.
    async fn list_files(&self, reverse_share_id: Uuid) -> AppResult<Vec<ReverseShareFile>>;

    /// Rename an uploaded file.
    async fn rename_file(&self, id: Uuid, name: &str) -> AppResult<ReverseShareFile>;

    /// Delete an uploaded file record.
    async fn delete_file(&self, id: Uuid) -> AppResult<()>;

    /// Atomically create the library entry and move the file from
    /// `pending` to `adopted`. Fails with `Conflict` when the file is no
    /// longer pending, in which case no library entry is created.
    async fn commit_adoption(&self, file_id: Uuid, library_file: &CreateFile) -> AppResult<File>;

    /// Move a file from `pending` to `failed`. Returns `false` when the file
    /// was not pending.
    async fn mark_failed(&self, file_id: Uuid) -> AppResult<bool>;

    /// Replace a `failed` record with a fresh `pending` registration of the
    /// same object. Fails with `Conflict` when the file is not failed.
    async fn reset_failed(&self, file_id: Uuid) -> AppResult<ReverseShareFile>;
}

/// PostgreSQL implementation of [`ReverseShareStore`].
#[derive(Debug, Clone)]
pub struct PgReverseShareRepository {
    pool: PgPool,
}

impl PgReverseShareRepository {
    /// Create a new reverse share repository.
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

/// A concurrent registration of the same object loses on the unique index.
fn registration_error(e: sqlx::Error) -> AppError {
    let err = db_error("Failed to register file")(e);
    if err.kind == ErrorKind::Conflict {
        AppError::conflict("File is already registered")
    } else {
        err
    }
}

const INSERT_FILE: &str = "INSERT INTO reverse_share_files \
     (id, reverse_share_id, name, extension, size, object_name, uploader_name, uploader_email, \
      adoption_state, registered_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', NOW()) RETURNING *";

#[async_trait]
impl ReverseShareStore for PgReverseShareRepository {
    async fn create(&self, data: &CreateReverseShare, alias: &Alias) -> AppResult<ReverseShare> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let reverse_share = sqlx::query_as::<_, ReverseShare>(
            "INSERT INTO reverse_shares (id, name, description, expiration, max_files, \
             max_file_size, allowed_file_types, password_hash, is_active, owner_id, created_at, \
             updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.expiration)
        .bind(data.max_files)
        .bind(data.max_file_size)
        .bind(&data.allowed_file_types)
        .bind(&data.password_hash)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create reverse share"))?;

        sqlx::query("INSERT INTO reverse_share_aliases (alias, reverse_share_id) VALUES ($1, $2)")
            .bind(alias.as_str())
            .bind(reverse_share.id)
            .execute(&mut *tx)
            .await
            .map_err(alias_error)?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit reverse share"))?;
        Ok(reverse_share)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReverseShare>> {
        sqlx::query_as::<_, ReverseShare>("SELECT * FROM reverse_shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find reverse share"))
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<ReverseShare>> {
        sqlx::query_as::<_, ReverseShare>(
            "SELECT r.* FROM reverse_shares r \
             JOIN reverse_share_aliases a ON a.reverse_share_id = r.id WHERE a.alias = $1",
        )
        .bind(alias)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find reverse share by alias"))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<ReverseShare>> {
        sqlx::query_as::<_, ReverseShare>(
            "SELECT * FROM reverse_shares WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list reverse shares"))
    }

    async fn update(&self, id: Uuid, changes: &UpdateReverseShare) -> AppResult<ReverseShare> {
        let mut rs = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Reverse share not found"))?;
        changes.apply_to(&mut rs);

        sqlx::query_as::<_, ReverseShare>(
            "UPDATE reverse_shares SET name = $2, description = $3, expiration = $4, \
             max_files = $5, max_file_size = $6, allowed_file_types = $7, is_active = $8, \
             updated_at = $9 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&rs.name)
        .bind(&rs.description)
        .bind(rs.expiration)
        .bind(rs.max_files)
        .bind(rs.max_file_size)
        .bind(&rs.allowed_file_types)
        .bind(rs.is_active)
        .bind(rs.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to update reverse share"))
    }

    async fn set_password_hash(&self, id: Uuid, hash: Option<&str>) -> AppResult<()> {
        sqlx::query(
            "UPDATE reverse_shares SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update reverse share password"))?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM reverse_shares WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete reverse share"))?;
        Ok(())
    }

    async fn alias_of(&self, reverse_share_id: Uuid) -> AppResult<Option<ReverseShareAlias>> {
        sqlx::query_as::<_, ReverseShareAlias>(
            "SELECT * FROM reverse_share_aliases WHERE reverse_share_id = $1",
        )
        .bind(reverse_share_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find reverse share alias"))
    }

    async fn set_alias(
        &self,
        reverse_share_id: Uuid,
        alias: &Alias,
    ) -> AppResult<ReverseShareAlias> {
        sqlx::query_as::<_, ReverseShareAlias>(
            "INSERT INTO reverse_share_aliases (alias, reverse_share_id, created_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (reverse_share_id) DO UPDATE SET alias = EXCLUDED.alias, created_at = NOW() \
             RETURNING *",
        )
        .bind(alias.as_str())
        .bind(reverse_share_id)
        .fetch_one(&self.pool)
        .await
        .map_err(alias_error)
    }

    async fn register_file(
        &self,
        file: &NewReverseShareFile,
        max_files: Option<i32>,
    ) -> AppResult<ReverseShareFile> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // Row lock serializes concurrent registrations against one share.
        sqlx::query("SELECT id FROM reverse_shares WHERE id = $1 FOR UPDATE")
            .bind(file.reverse_share_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock reverse share"))?
            .ok_or_else(|| AppError::not_found("Reverse share not found"))?;

        let registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reverse_share_files WHERE object_name = $1)",
        )
        .bind(&file.object_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to check file registration"))?;
        if registered {
            return Err(AppError::conflict("File is already registered"));
        }

        if let Some(max) = max_files {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM reverse_share_files WHERE reverse_share_id = $1",
            )
            .bind(file.reverse_share_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to count reverse share files"))?;
            if count >= i64::from(max) {
                return Err(AppError::validation("Maximum number of files reached"));
            }
        }

        let registered = sqlx::query_as::<_, ReverseShareFile>(INSERT_FILE)
            .bind(Uuid::new_v4())
            .bind(file.reverse_share_id)
            .bind(&file.name)
            .bind(&file.extension)
            .bind(file.size)
            .bind(&file.object_name)
            .bind(&file.uploader_name)
            .bind(&file.uploader_email)
            .fetch_one(&mut *tx)
            .await
            .map_err(registration_error)?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit file registration"))?;
        Ok(registered)
    }

    async fn find_file(&self, id: Uuid) -> AppResult<Option<ReverseShareFile>> {
        sqlx::query_as::<_, ReverseShareFile>("SELECT * FROM reverse_share_files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find reverse share file"))
    }

    async fn list_files(&self, reverse_share_id: Uuid) -> AppResult<Vec<ReverseShareFile>> {
        sqlx::query_as::<_, ReverseShareFile>(
            "SELECT * FROM reverse_share_files WHERE reverse_share_id = $1 ORDER BY registered_at",
        )
        .bind(reverse_share_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list reverse share files"))
    }

    async fn rename_file(&self, id: Uuid, name: &str) -> AppResult<ReverseShareFile> {
        sqlx::query_as::<_, ReverseShareFile>(
            "UPDATE reverse_share_files SET name = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to rename reverse share file"))?
        .ok_or_else(|| AppError::not_found("File not found"))
    }

    async fn delete_file(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM reverse_share_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete reverse share file"))?;
        Ok(())
    }

    async fn commit_adoption(&self, file_id: Uuid, library_file: &CreateFile) -> AppResult<File> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let file = sqlx::query_as::<_, File>(
            "INSERT INTO files (id, name, extension, size, object_name, owner_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&library_file.name)
        .bind(&library_file.extension)
        .bind(library_file.size)
        .bind(&library_file.object_name)
        .bind(library_file.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create library file"))?;

        let updated = sqlx::query(
            "UPDATE reverse_share_files SET adoption_state = $2, adopted_file_id = $3 \
             WHERE id = $1 AND adoption_state = $4",
        )
        .bind(file_id)
        .bind(AdoptionState::Adopted)
        .bind(file.id)
        .bind(AdoptionState::Pending)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to mark file adopted"))?;

        if updated.rows_affected() != 1 {
            // Dropping the transaction rolls back the library insert.
            return Err(AppError::conflict("File is no longer pending adoption"));
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit adoption"))?;
        Ok(file)
    }

    async fn mark_failed(&self, file_id: Uuid) -> AppResult<bool> {
        let updated = sqlx::query(
            "UPDATE reverse_share_files SET adoption_state = $2 WHERE id = $1 AND adoption_state = $3",
        )
        .bind(file_id)
        .bind(AdoptionState::Failed)
        .bind(AdoptionState::Pending)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark file failed"))?;
        Ok(updated.rows_affected() == 1)
    }

    async fn reset_failed(&self, file_id: Uuid) -> AppResult<ReverseShareFile> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let failed = sqlx::query_as::<_, ReverseShareFile>(
            "DELETE FROM reverse_share_files WHERE id = $1 AND adoption_state = $2 RETURNING *",
        )
        .bind(file_id)
        .bind(AdoptionState::Failed)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to remove failed file"))?
        .ok_or_else(|| AppError::conflict("File is not in a failed state"))?;

        let fresh = NewReverseShareFile::from(&failed);
        let registered = sqlx::query_as::<_, ReverseShareFile>(INSERT_FILE)
            .bind(Uuid::new_v4())
            .bind(fresh.reverse_share_id)
            .bind(&fresh.name)
            .bind(&fresh.extension)
            .bind(fresh.size)
            .bind(&fresh.object_name)
            .bind(&fresh.uploader_name)
            .bind(&fresh.uploader_email)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to re-register file"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit re-registration"))?;
        Ok(registered)
    }
}

//! Library file repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use sharegate_core::result::AppResult;
use sharegate_entity::file::{CreateFile, File};

use super::db_error;

/// Persistence for library files.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug {
    /// Insert a library entry.
    async fn create(&self, data: &CreateFile) -> AppResult<File>;

    /// Find a file by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>>;

    /// Fetch several files; missing IDs are skipped, order is unspecified.
    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<File>>;

    /// List a user's files, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>>;

    /// Summed size of a user's files in bytes.
    async fn total_size(&self, owner_id: Uuid) -> AppResult<i64>;

    /// Delete a library entry.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// PostgreSQL implementation of [`FileStore`].
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for PgFileRepository {
    async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, name, extension, size, object_name, owner_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.extension)
        .bind(data.size)
        .bind(&data.object_name)
        .bind(data.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create file"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find file"))
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch files"))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE owner_id = $1 ORDER BY created_at DESC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list files"))
    }

    async fn total_size(&self, owner_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COALESCE(SUM(size), 0)::BIGINT FROM files WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to sum file sizes"))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete file"))?;
        Ok(())
    }
}

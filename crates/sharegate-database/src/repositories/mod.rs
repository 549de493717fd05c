//! Repository traits and their implementations.
//!
//! Services depend on the `*Store` traits only. [`Repositories`] bundles
//! one implementation of each, either backed by PostgreSQL or by the
//! in-process [`memory::MemoryDatabase`].

pub mod file;
pub mod memory;
pub mod reverse_share;
pub mod share;

use std::sync::Arc;

use sqlx::PgPool;

use sharegate_core::error::{AppError, ErrorKind};

pub use file::{FileStore, PgFileRepository};
pub use memory::MemoryDatabase;
pub use reverse_share::{PgReverseShareRepository, ReverseShareStore};
pub use share::{PgShareRepository, ShareStore};

/// One implementation of every store, shared across services.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// Shares, their files, recipients and aliases.
    pub shares: Arc<dyn ShareStore>,
    /// Reverse shares, their aliases and uploaded files.
    pub reverse_shares: Arc<dyn ReverseShareStore>,
    /// Library files.
    pub files: Arc<dyn FileStore>,
}

impl Repositories {
    /// PostgreSQL-backed stores.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            shares: Arc::new(PgShareRepository::new(pool.clone())),
            reverse_shares: Arc::new(PgReverseShareRepository::new(pool.clone())),
            files: Arc::new(PgFileRepository::new(pool)),
        }
    }

    /// In-process stores sharing one set of tables.
    pub fn memory() -> Self {
        let db = Arc::new(MemoryDatabase::new());
        Self {
            shares: db.clone(),
            reverse_shares: db.clone(),
            files: db,
        }
    }
}

/// Map a sqlx error, turning unique violations into `Conflict`.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            AppError::with_source(ErrorKind::Conflict, format!("{context}: already exists"), e)
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}

//! # sharegate-core
//!
//! Core crate for Sharegate. Contains the configuration schema, the
//! object store collaborator trait, typed identifiers, domain events,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Sharegate crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;

//! # sharegate-entity
//!
//! Domain entity models for Sharegate. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`.

pub mod alias;
pub mod file;
pub mod reverse_share;
pub mod share;

pub use alias::Alias;

//! # sharegate-database
//!
//! PostgreSQL pool management, embedded migrations, and the repository
//! traits the services depend on. Every trait has a Postgres
//! implementation and an in-memory one.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::Repositories;

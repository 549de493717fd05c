//! # sharegate-api
//!
//! HTTP API layer for Sharegate built on Axum.
//!
//! Public routes resolve aliases, redeem locally presigned handles and
//! expose the download queue; owner routes manage shares, reverse shares
//! and the library behind a Bearer token.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;

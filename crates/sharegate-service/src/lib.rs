//! # sharegate-service
//!
//! Business logic for Sharegate. Services take their collaborators at
//! construction time as `Arc` references and receive the acting owner as a
//! [`RequestContext`].
//!
//! - [`access`] resolves aliases through the password and gate checks
//! - [`download`] admits outbound transfers under a concurrency ceiling
//! - [`adoption`] copies reverse-share uploads into an owner's library
//! - [`share`], [`reverse_share`] and [`file`] are the owner-facing CRUD

pub mod access;
pub mod adoption;
pub mod context;
pub mod download;
pub mod file;
pub mod patch;
pub mod reverse_share;
pub mod share;

#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessResolver;
pub use adoption::AdoptionPipeline;
pub use context::RequestContext;
pub use download::DownloadQueue;
pub use file::LibraryService;
pub use reverse_share::{DownloadHandle, ReverseShareService};
pub use share::ShareService;

//! Request handlers, grouped by resource.

pub mod file;
pub mod filesystem;
pub mod health;
pub mod public;
pub mod queue;
pub mod reverse_share;
pub mod share;

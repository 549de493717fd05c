//! Reverse share domain entities.

pub mod file;
pub mod model;

pub use file::{AdoptionState, NewReverseShareFile, ReverseShareFile};
pub use model::{CreateReverseShare, ReverseShare, ReverseShareAlias, UpdateReverseShare};

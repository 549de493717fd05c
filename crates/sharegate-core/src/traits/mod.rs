//! Collaborator traits implemented by other crates.

pub mod storage;

pub use storage::{ByteStream, ObjectStore, Transfer};

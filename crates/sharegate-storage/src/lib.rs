//! # sharegate-storage
//!
//! Object store providers for Sharegate. The S3 provider presigns natively;
//! the local provider presigns by issuing tokens that the HTTP surface
//! redeems under `/api/filesystem/`.

pub mod factory;
pub mod providers;

pub use factory::{BuiltStore, build_object_store};
pub use providers::LocalObjectStore;

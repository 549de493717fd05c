//! HTTP-level tests against the full router with in-memory stores and a
//! temporary local object store.

mod download_test;
mod helpers;
mod reverse_share_test;
mod share_test;

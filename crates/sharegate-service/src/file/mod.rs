//! Owner library operations.

pub mod quota;
pub mod service;

pub use quota::StorageQuota;
pub use service::{LibraryService, LibraryUploadGrant, LibraryUploadRequest, RegisterFileRequest};

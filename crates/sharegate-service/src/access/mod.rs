//! Access resolution for shares and reverse shares.

pub mod gate;
pub mod resolver;

pub use gate::{AccessState, Gated};
pub use resolver::{
    AccessResolver, RegisterUpload, ResolvedShare, ReverseShareInfo, SharedFile, UploadGrant,
    UploadRequest,
};

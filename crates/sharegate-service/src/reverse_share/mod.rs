//! Owner-facing reverse share management.

pub mod service;

pub use service::{
    CreateReverseShareRequest, DownloadHandle, ReverseShareDetails, ReverseShareService,
    UpdateReverseShareRequest,
};

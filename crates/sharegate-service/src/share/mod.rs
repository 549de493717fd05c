//! Owner-facing share management.

pub mod service;

pub use service::{
    CreateShareRequest, NotifiedRecipients, ShareDetails, ShareService, UpdateShareRequest,
};

//! Request and response bodies owned by the HTTP layer.

pub mod request;
pub mod response;

//! Token issuer for presigned handles and registration tokens.

pub mod claims;
pub mod issuer;

pub use claims::{Grant, TokenClaims, TokenOperation, registration_resource};
pub use issuer::TokenIssuer;

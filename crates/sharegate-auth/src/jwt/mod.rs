//! Owner access tokens.
//!
//! Accounts live in an external service; Sharegate only needs the user id
//! carried by the bearer token that service signs.

pub mod claims;
pub mod decoder;
pub mod encoder;

pub use claims::Claims;
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;

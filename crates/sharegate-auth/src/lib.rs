//! # sharegate-auth
//!
//! Credential primitives for Sharegate.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing for share and reverse-share passwords
//! - `token`: the token issuer: signed, single-purpose, time-boxed grants
//! - `jwt`: owner access tokens issued by the account service

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::PasswordHasher;
pub use token::{Grant, TokenIssuer, TokenOperation};

//! Password hashing for share and reverse-share passwords.

pub mod hasher;

pub use hasher::PasswordHasher;

//! The per-attempt access state machine.
//!
//! ```text
//! Start -> PasswordRequired -> Unlocked -> Resolved
//!       -> Open ------------------------> Resolved
//! ```
//!
//! The password check always runs before the gate (expiration, view limit,
//! activity). Nothing here is persisted: every attempt starts from `Start`
//! and a verified password unlocks only that attempt.

use chrono::{DateTime, Utc};

use sharegate_auth::password::PasswordHasher;
use sharegate_core::error::AppError;
use sharegate_core::result::AppResult;
use sharegate_entity::reverse_share::ReverseShare;
use sharegate_entity::share::Share;

/// An entity that can be unlocked by alias.
pub trait Gated: Send {
    /// Stored password hash, if the entity is protected.
    fn password_hash(&self) -> Option<&str>;

    /// Entity-specific conditions checked after the password.
    fn check_gate(&self, now: DateTime<Utc>) -> AppResult<()>;
}

impl Gated for Share {
    fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    fn check_gate(&self, now: DateTime<Utc>) -> AppResult<()> {
        if self.is_expired_at(now) {
            return Err(AppError::expired("Share has expired"));
        }
        if self.is_exhausted() {
            return Err(AppError::view_limit_reached(
                "Share has reached its view limit",
            ));
        }
        Ok(())
    }
}

impl Gated for ReverseShare {
    fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    fn check_gate(&self, now: DateTime<Utc>) -> AppResult<()> {
        if !self.is_active {
            return Err(AppError::forbidden("Reverse share is inactive"));
        }
        if self.is_expired_at(now) {
            return Err(AppError::expired("Reverse share has expired"));
        }
        Ok(())
    }
}

/// Where a single resolution attempt stands.
#[derive(Debug)]
pub enum AccessState<T> {
    /// A password hash is set; the supplied password must verify.
    PasswordRequired(T),
    /// No password is set.
    Open(T),
    /// The supplied password verified.
    Unlocked(T),
    /// The gate passed.
    Resolved(T),
}

impl<T: Gated> AccessState<T> {
    /// First state for a loaded entity.
    pub fn start(entity: T) -> Self {
        if entity.password_hash().is_some() {
            Self::PasswordRequired(entity)
        } else {
            Self::Open(entity)
        }
    }

    /// Take one transition.
    pub async fn advance(
        self,
        password: Option<&str>,
        hasher: &PasswordHasher,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        match self {
            Self::PasswordRequired(entity) => {
                let Some(password) = password else {
                    return Err(AppError::invalid_password("Password required"));
                };
                let hash = entity.password_hash().unwrap_or_default().to_string();
                if verify(hasher, password, hash).await? {
                    Ok(Self::Unlocked(entity))
                } else {
                    Err(AppError::invalid_password("Invalid password"))
                }
            }
            Self::Open(entity) | Self::Unlocked(entity) => {
                entity.check_gate(now)?;
                Ok(Self::Resolved(entity))
            }
            resolved @ Self::Resolved(_) => Ok(resolved),
        }
    }
}

/// Run an attempt from `Start` to `Resolved`.
///
/// A missing entity fails `NotFound`; when the caller supplied a password
/// one dummy verification runs first so the timing matches a wrong
/// password.
pub async fn unlock<T: Gated>(
    entity: Option<T>,
    password: Option<&str>,
    hasher: &PasswordHasher,
    now: DateTime<Utc>,
    not_found: &'static str,
) -> AppResult<T> {
    let Some(entity) = entity else {
        if let Some(password) = password {
            let hasher = hasher.clone();
            let password = password.to_string();
            let _ = tokio::task::spawn_blocking(move || hasher.verify_dummy(&password)).await;
        }
        return Err(AppError::not_found(not_found));
    };

    let mut state = AccessState::start(entity);
    loop {
        state = match state {
            AccessState::Resolved(entity) => return Ok(entity),
            other => other.advance(password, hasher, now).await?,
        };
    }
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn verify(hasher: &PasswordHasher, password: &str, hash: String) -> AppResult<bool> {
    let hasher = hasher.clone();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password check aborted: {e}")))?
}

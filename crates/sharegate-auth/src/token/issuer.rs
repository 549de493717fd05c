//! Signed, single-purpose, time-boxed tokens.
//!
//! A token is an HS256 JWT over `(resource, operation, expiry)`. Nothing
//! is stored server-side: validity is re-derived from the signature and
//! the embedded expiry on every use, so there is no revocation list and
//! short TTLs are the only mitigation for leaked tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, warn};
use uuid::Uuid;

use sharegate_core::config::AuthConfig;
use sharegate_core::error::AppError;

use super::claims::{Grant, TokenClaims, TokenOperation};

/// Mints and validates tokens with one signing secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer signing with `secret`.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `validate_at`.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Create an issuer from the `auth.token_secret` setting.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.token_secret)
    }

    /// Issue a token for one `operation` on `resource`, valid for `ttl`.
    pub fn issue(
        &self,
        resource: &str,
        operation: TokenOperation,
        ttl: Duration,
    ) -> Result<String, AppError> {
        self.issue_at(resource, operation, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        resource: &str,
        operation: TokenOperation,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::internal(format!("Token TTL out of range: {e}")))?;
        let claims = TokenClaims {
            sub: resource.to_string(),
            op: operation,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;

        debug!(jti = %claims.jti, op = %operation, exp = claims.exp, "Token issued");
        Ok(token)
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<Grant, AppError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token against `now`.
    ///
    /// Fails with `Malformed` when the token cannot be decoded or its
    /// signature does not verify, and with `Expired` once `now` reaches the
    /// embedded expiry.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Grant, AppError> {
        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                warn!(reason = ?e.kind(), "Rejected malformed token");
                AppError::malformed("Invalid token")
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AppError::expired("Token has expired"));
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::malformed("Invalid token"))?;

        Ok(Grant {
            resource: claims.sub,
            operation: claims.op,
            expires_at,
        })
    }

    /// Validate a token and require that it authorizes `expected`.
    pub fn validate_for(&self, token: &str, expected: TokenOperation) -> Result<Grant, AppError> {
        self.validate_for_at(token, expected, Utc::now())
    }

    /// [`Self::validate_for`] against an explicit clock.
    pub fn validate_for_at(
        &self,
        token: &str,
        expected: TokenOperation,
        now: DateTime<Utc>,
    ) -> Result<Grant, AppError> {
        let grant = self.validate_at(token, now)?;
        if grant.operation != expected {
            warn!(
                expected = %expected,
                actual = %grant.operation,
                "Rejected token used for the wrong operation"
            );
            return Err(AppError::operation_mismatch("Invalid token"));
        }
        Ok(grant)
    }
}

//! Owner access-token signing.
//!
//! Production tokens come from the account service. The encoder exists for
//! tooling and tests that need a token the decoder accepts.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use sharegate_core::config::AuthConfig;
use sharegate_core::error::AppError;
use sharegate_core::types::UserId;

use super::claims::Claims;

/// Signs owner access tokens with `auth.jwt_secret`.
#[derive(Debug, Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Sign an access token for `user_id` valid for `ttl_seconds`.
    pub fn generate_access_token(
        &self,
        user_id: UserId,
        ttl_seconds: i64,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.into_uuid(),
            iat: now.timestamp(),
            exp: now.timestamp() + ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use sharegate_core::error::ErrorKind;

    use super::*;
    use crate::jwt::JwtDecoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.into(),
            token_secret: "unused-token-secret".into(),
            leeway_seconds: 0,
        }
    }

    #[test]
    fn test_encoded_token_decodes_to_same_user() {
        let cfg = config("owner-secret-for-tests");
        let user = UserId::new();
        let token = JwtEncoder::new(&cfg).generate_access_token(user, 300).unwrap();

        let claims = JwtDecoder::new(&cfg).decode_access_token(&token).unwrap();
        assert_eq!(claims.user_id(), user);
    }

    #[test]
    fn test_expired_and_foreign_tokens_are_unauthorized() {
        let cfg = config("owner-secret-for-tests");
        let expired = JwtEncoder::new(&cfg)
            .generate_access_token(UserId::new(), -120)
            .unwrap();
        let err = JwtDecoder::new(&cfg).decode_access_token(&expired).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let foreign = JwtEncoder::new(&config("some-other-secret"))
            .generate_access_token(UserId::new(), 300)
            .unwrap();
        let err = JwtDecoder::new(&cfg).decode_access_token(&foreign).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }
}

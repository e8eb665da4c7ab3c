//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use visitdesk_core::config::auth::AuthConfig;
use visitdesk_core::error::AppError;

use super::claims::{Claims, TokenType};

/// Validates signature, expiry, and token type.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode an access token.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Access)
    }

    /// Decode a refresh token.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Refresh)
    }

    fn decode_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                _ => AppError::authentication(format!("Invalid token: {e}")),
            })?
            .claims;

        if claims.token_type != expected {
            return Err(AppError::authentication(format!(
                "Invalid token type: expected {expected:?} token"
            )));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use uuid::Uuid;
    use visitdesk_core::error::ErrorKind;
    use visitdesk_entity::user::UserRole;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.into(),
            ..Default::default()
        }
    }

    #[test]
    fn round_trips_claims() {
        let cfg = config("desk-secret");
        let user_id = Uuid::new_v4();
        let pair = JwtEncoder::new(&cfg)
            .generate_token_pair(user_id, UserRole::Security, "guard1")
            .unwrap();
        let claims = JwtDecoder::new(&cfg)
            .decode_access_token(&pair.access_token)
            .unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Security);
        assert_eq!(claims.username, "guard1");
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let cfg = config("desk-secret");
        let pair = JwtEncoder::new(&cfg)
            .generate_token_pair(Uuid::new_v4(), UserRole::Staff, "desk")
            .unwrap();
        let decoder = JwtDecoder::new(&cfg);
        let err = decoder.decode_access_token(&pair.refresh_token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert!(decoder.decode_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let pair = JwtEncoder::new(&config("one"))
            .generate_token_pair(Uuid::new_v4(), UserRole::Admin, "root")
            .unwrap();
        assert!(
            JwtDecoder::new(&config("two"))
                .decode_access_token(&pair.access_token)
                .is_err()
        );
    }
}

use crate::{config::AuthConfig, error::Result, models::common::AccountTier};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (opaque user id)
    pub sub: String,
    /// Account tier
    pub tier: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

pub struct JWTService {
    config: Arc<AuthConfig>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JWTService {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate a JWT access token for a user (short-lived)
    pub fn generate_token(&self, user_id: &str, account_tier: AccountTier) -> Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let exp = now + (self.config.access_token_expiration_minutes as i64 * 60);

        let claims = Claims {
            sub: user_id.to_string(),
            tier: account_tier.as_str().to_string(),
            iat: now,
            exp,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| crate::error::ApiError::Internal(e.into()))?;

        Ok(token)
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    crate::error::ApiError::ExpiredToken
                }
                _ => crate::error::ApiError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Extract account_tier from claims
    pub fn account_tier_from_claims(claims: &Claims) -> Result<AccountTier> {
        AccountTier::from_str(&claims.tier).ok_or_else(|| {
            crate::error::ApiError::InvalidToken(format!(
                "Invalid account tier: {}",
                claims.tier
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            jwt_secret: "test-secret-key-with-minimum-32-characters-required".to_string(),
            access_token_expiration_minutes: 15,
        })
    }

    #[test]
    fn test_generate_and_validate_token() {
        let service = JWTService::new(test_config());

        let token = service.generate_token("user-abc", AccountTier::Premium).unwrap();
        assert!(!token.is_empty());

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-abc");
        assert_eq!(claims.tier, "premium");

        let tier = JWTService::account_tier_from_claims(&claims).unwrap();
        assert_eq!(tier, AccountTier::Premium);
    }

    #[test]
    fn test_invalid_token() {
        let service = JWTService::new(test_config());
        let result = service.validate_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_all_tiers() {
        let service = JWTService::new(test_config());

        for tier in [AccountTier::Free, AccountTier::Premium] {
            let token = service.generate_token("user-1", tier).unwrap();
            let claims = service.validate_token(&token).unwrap();
            let extracted = JWTService::account_tier_from_claims(&claims).unwrap();
            assert_eq!(extracted, tier);
        }
    }
}

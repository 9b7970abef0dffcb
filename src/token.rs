// src/token.rs
use crate::config::Config;
use crate::error::AppError;
use crate::models::users::Claims;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Issues access tokens and opaque refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    jwt_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// Access token together with its expiry.
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenService {
    pub fn new(jwt_secret: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            Duration::minutes(config.access_token_minutes),
            Duration::days(config.refresh_token_days),
        )
    }

    pub fn issue_access_token(&self, user_id: Uuid, role: &str) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + self.access_ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::internal(format!("token generation failed: {e}")))?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Rejected access token: {}", e);
            AppError::Unauthorized("Invalid or expired token")
        })
    }

    /// Fresh opaque refresh token; only its hash is ever persisted.
    pub fn generate_refresh_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn hash_refresh_token(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    pub fn refresh_expiry(&self) -> DateTime<Utc> {
        Utc::now() + self.refresh_ttl
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret-key-minimum-32-characters-long",
            Duration::minutes(15),
            Duration::days(7),
        )
    }

    #[test]
    fn access_token_round_trips_claims() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let issued = svc.issue_access_token(user_id, "Admin").unwrap();

        let claims = svc.validate_access_token(&issued.token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "Admin");
        assert_eq!(claims.exp as i64, issued.expires_at.timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = service()
            .issue_access_token(Uuid::new_v4(), "User")
            .unwrap();
        let other = TokenService::new("another-secret", Duration::minutes(15), Duration::days(7));
        assert!(matches!(
            other.validate_access_token(&issued.token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // beyond the default 60s leeway
        let svc = TokenService::new("secret", Duration::minutes(-5), Duration::days(7));
        let issued = svc.issue_access_token(Uuid::new_v4(), "User").unwrap();
        assert!(svc.validate_access_token(&issued.token).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_hash_stably() {
        let svc = service();
        let a = svc.generate_refresh_token();
        let b = svc.generate_refresh_token();
        assert_ne!(a, b);
        assert_eq!(TokenService::hash_refresh_token(&a), TokenService::hash_refresh_token(&a));
        assert_eq!(TokenService::hash_refresh_token(&a).len(), 64);
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", service());
        assert!(!rendered.contains("test-secret-key"));
    }
}

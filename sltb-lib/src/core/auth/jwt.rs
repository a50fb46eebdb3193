use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sltb_database::types::UserRole;

use crate::config::AuthConfig;
use crate::error::ApplicationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: i64,
}

impl JwtManager {
    pub fn new(config: &AuthConfig) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            expiry_seconds: config.jwt_expiry_seconds,
        }
    }

    pub fn issue(&self, user_id: i32, email: &str, role: UserRole) -> Result<String, ApplicationError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.expiry_seconds,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApplicationError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Rejects bad signatures and expired tokens alike.
    pub fn verify(&self, token: &str) -> Result<Claims, ApplicationError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| ApplicationError::Unauthorized("Invalid or expired token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str, expiry_seconds: i64) -> JwtManager {
        JwtManager::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_expiry_seconds: expiry_seconds,
        })
    }

    #[test]
    fn issued_token_verifies() {
        let jwt = manager("0123456789abcdef0123456789abcdef", 3600);
        let token = jwt.issue(7, "officer@sltb.lk", UserRole::Officer).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "officer@sltb.lk");
        assert_eq!(claims.role, UserRole::Officer);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = manager("0123456789abcdef0123456789abcdef", 3600)
            .issue(1, "a@b.c", UserRole::User)
            .unwrap();
        let other = manager("fedcba9876543210fedcba9876543210", 3600);
        assert!(matches!(other.verify(&token), Err(ApplicationError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default 60s leeway.
        let jwt = manager("0123456789abcdef0123456789abcdef", -120);
        let token = jwt.issue(1, "a@b.c", UserRole::User).unwrap();
        assert!(jwt.verify(&token).is_err());
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::permissions::PermissionBit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub user_id: i64,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(email: impl Into<String>, user_id: i64) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: email.into(),
            user_id,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn decode_jwt(token: &str) -> Result<Claims, JwtError> {
    decode_jwt_with_secret(token, &config::config().security.jwt_secret)
}

pub fn decode_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    ApiKey,
    Jwt,
}

/// Authenticated caller, attached to each protected request.
#[derive(Debug, Clone)]
pub struct AccessInfo {
    pub user_id: i64,
    pub user_email: String,
    pub access_type: AccessType,
    pub permissions: Vec<PermissionBit>,
}

impl AccessInfo {
    pub fn has_permission(&self, bit: PermissionBit) -> bool {
        self.permissions.contains(&bit)
    }
}

/// Hex SHA-256 digest; API keys are stored only in this form.
pub fn hash_api_key(raw_key: &str) -> String {
    format!("{:x}", Sha256::digest(raw_key.as_bytes()))
}

pub fn generate_api_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_round_trips_with_secret() {
        let claims = Claims::new("someone@example.com", 42);
        let token = generate_jwt_with_secret(&claims, "test-secret").unwrap();
        let decoded = decode_jwt_with_secret(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, "someone@example.com");
        assert_eq!(decoded.user_id, 42);
    }

    #[test]
    fn jwt_rejects_wrong_secret_and_empty_secret() {
        let token = generate_jwt_with_secret(&Claims::new("a@b.c", 1), "one").unwrap();
        assert!(matches!(decode_jwt_with_secret(&token, "two"), Err(JwtError::InvalidToken(_))));
        assert!(matches!(decode_jwt_with_secret(&token, ""), Err(JwtError::InvalidSecret)));
        assert!(matches!(generate_jwt_with_secret(&Claims::new("a@b.c", 1), ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut claims = Claims::new("a@b.c", 1);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = generate_jwt_with_secret(&claims, "s").unwrap();
        assert!(decode_jwt_with_secret(&token, "s").is_err());
    }

    #[test]
    fn api_key_digest_is_hex_sha256() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let key = generate_api_key();
        assert_eq!(key.len(), 32);
        assert_ne!(hash_api_key(&key), key);
    }

    #[test]
    fn has_permission_checks_bits() {
        let access = AccessInfo {
            user_id: 1,
            user_email: "a@b.c".to_string(),
            access_type: AccessType::Jwt,
            permissions: vec![PermissionBit::DbWrite],
        };
        assert!(access.has_permission(PermissionBit::DbWrite));
        assert!(!access.has_permission(PermissionBit::Notifications));
    }
}

// JWT issuance and verification
// Access and refresh tokens are signed with independent secrets; a token
// signed with one secret never verifies against the other.

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::config::AuthConfig;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id
    pub sub: i32,
    /// Issued-at timestamp (seconds)
    pub iat: i64,
    /// Expiry timestamp (seconds)
    pub exp: i64,
    /// Unique token id; keeps tokens minted within the same second distinct
    pub jti: String,
}

/// Token service for issuing and verifying access/refresh tokens.
///
/// Secrets are passed in explicitly at construction; nothing is read from
/// ambient process state, so tests can run with distinct secrets per case.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Issue a short-lived access token for the given user
    pub fn issue_access_token(&self, user_id: i32) -> Result<String, AuthError> {
        self.sign(user_id, self.access_ttl_secs, &self.access_encoding)
    }

    /// Issue a long-lived refresh token for the given user
    pub fn issue_refresh_token(&self, user_id: i32) -> Result<String, AuthError> {
        self.sign(user_id, self.refresh_ttl_secs, &self.refresh_encoding)
    }

    /// Issue both tokens for a login
    pub fn issue_token_pair(&self, user_id: i32) -> Result<(String, String), AuthError> {
        let access = self.issue_access_token(user_id)?;
        let refresh = self.issue_refresh_token(user_id)?;
        Ok((access, refresh))
    }

    /// Verify an access token (secret A)
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        Self::verify(token, &self.access_decoding)
    }

    /// Verify a refresh token (secret B)
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        Self::verify(token, &self.refresh_decoding)
    }

    fn sign(&self, user_id: i32, ttl_secs: i64, key: &EncodingKey) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    fn verify(token: &str, key: &DecodingKey) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

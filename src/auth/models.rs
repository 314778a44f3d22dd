// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::UserResponse;

/// Session database model
///
/// At most one row exists per user at any time; a new login replaces the
/// previous row. The refresh token is stored as a SHA-256 hash, so lookups
/// hash the presented token before matching.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub refresh_token_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration request DTO
/// Required-field checks live in the service so the error shape matches
/// the original API.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request DTO
/// Wire field name matches the original API (`refreshToken`).
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: String,
}

/// Login response DTO: `{user, token, refreshToken}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Refresh response DTO: `{token}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
}

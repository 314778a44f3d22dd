// Authentication error types and their HTTP translation

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

/// Authentication error types
///
/// The open endpoints (register/login) report validation, not-found and
/// bad-password failures as HTTP 200 with an `{"error": ...}` body. That is
/// the wire contract inherited from the original service and is preserved
/// for client compatibility. Token failures are 401, storage failures 500.
#[derive(Debug)]
pub enum AuthError {
    ValidationError(String),
    NotFound,
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,
    MissingToken,
    EmailAlreadyExists,
    DatabaseError(String),
    PasswordHashError,
    TokenGenerationError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AuthError::NotFound => write!(f, "User not found!"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::EmailAlreadyExists => write!(f, "Email is already registered!"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::OK,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials => StatusCode::OK,
            AuthError::EmailAlreadyExists => StatusCode::OK,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no secrets, no digests)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::NotFound => "User Not Found".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::InvalidToken => "Invalid Token".to_string(),
            AuthError::ExpiredToken => "Invalid or Expired Refresh Token!".to_string(),
            AuthError::MissingToken => "Access denied. No token provided.".to_string(),
            AuthError::EmailAlreadyExists => "Email is already registered!".to_string(),
            AuthError::DatabaseError(_) => "Internal server error".to_string(),
            AuthError::PasswordHashError => "Internal server error".to_string(),
            AuthError::TokenGenerationError(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::InvalidToken => warn!("Invalid token attempt"),
            AuthError::ExpiredToken => warn!("Expired token attempt"),
            AuthError::MissingToken => warn!("Missing token in request"),
            AuthError::DatabaseError(msg) => error!("Database error in auth: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            _ => {}
        }

        let body = Json(json!({
            "error": self.error_message(),
        }));

        (self.status_code(), body).into_response()
    }
}

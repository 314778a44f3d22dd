// Error handling for the user CRUD surface
// The auth core has its own taxonomy in auth::error; this type covers the
// thin profile handlers and translates store failures to responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{debug, error};

use crate::auth::error::AuthError;

/// Error type for the user CRUD handlers
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failures, HTTP 400
    ValidationError(validator::ValidationErrors),

    /// Missing user record, HTTP 404
    NotFound { resource: String, id: String },

    /// Storage or other internal failures, HTTP 500.
    /// Details are logged, never sent to the client.
    InternalError(String),
}

impl ApiError {
    fn to_response_parts(&self) -> (StatusCode, String) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (StatusCode::BAD_REQUEST, "Invalid request".to_string())
            }
            ApiError::NotFound { resource, id } => {
                debug!("{} with id {} not found", resource, id);
                (StatusCode::NOT_FOUND, "User not found!".to_string())
            }
            ApiError::InternalError(message) => {
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.to_response_parts();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound => ApiError::NotFound {
                resource: "User".to_string(),
                id: "?".to_string(),
            },
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

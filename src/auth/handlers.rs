// HTTP handlers for authentication endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest},
    service::AuthService,
};
use crate::models::{MessageResponse, UserResponse};

/// Register a new user
/// POST /user/register
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 200, description = "Missing fields or email taken", body = String, example = json!({"error": "Email is already registered!"})),
        (status = 500, description = "Registration failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let message = service.register(&request).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Login a user
/// POST /user/login
#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = LoginResponse),
        (status = 500, description = "Login failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    match service.login(&request).await {
        Ok(response) => Ok(Json(response).into_response()),
        // The original API reports an unknown email on login in a 200 body,
        // unlike the gated lookups where a missing user is a 404
        Err(AuthError::NotFound) => {
            Ok(Json(json!({ "error": "User not found!" })).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Exchange a refresh token for a new access token
/// POST /user/refreshToken
#[utoipa::path(
    post,
    path = "/user/refreshToken",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = String, example = json!({"error": "Invalid Token"})),
        (status = 500, description = "Refresh failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AuthError> {
    let response = service.refresh(&request).await?;
    Ok(Json(response))
}

/// Resolve the user record behind the presented access token
/// GET /user/infor
#[utoipa::path(
    get,
    path = "/user/infor",
    responses(
        (status = 200, description = "User behind the token", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = String, example = json!({"error": "Access denied. No token provided."})),
        (status = 500, description = "Lookup failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn token_detail_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let response = service.get_user(user.user_id).await?;
    Ok(Json(response))
}

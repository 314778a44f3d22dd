// Authentication service - business logic layer
// Composes the credential verifier, token service and stores into the
// login, refresh and registration flows.

use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest},
    password::PasswordService,
    repository::{SessionStore, UserStore},
    token::TokenService,
};
use crate::models::UserResponse;

/// Authentication service coordinating all auth operations
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
        }
    }

    /// Register a new user. Returns the confirmation message for the
    /// response body.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = PasswordService::hash_password(&request.password)?;
        let user = self
            .users
            .create(&request.name, &request.email, &password_hash)
            .await?;

        tracing::info!("Registered new user with id {}", user.id);
        Ok(format!(
            "An account has been created for {} successfully!",
            user.email
        ))
    }

    /// Login: verify credentials, then replace any existing session and
    /// hand out a fresh access+refresh pair.
    ///
    /// Token issuance and session persistence form one logical unit: if the
    /// session cannot be persisted, the login fails and no tokens reach the
    /// caller.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !PasswordService::verify_password(&request.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let (access_token, refresh_token) = self.tokens.issue_token_pair(user.id)?;

        // Atomic replace: the previous session for this user (if any) is
        // superseded in the same step that persists the new refresh token.
        self.sessions.replace_session(user.id, &refresh_token).await?;

        tracing::debug!("User {} logged in, session replaced", user.id);
        Ok(LoginResponse {
            user: UserResponse::from(user),
            token: access_token,
            refresh_token,
        })
    }

    /// Refresh: mint a new access token against a persisted refresh token.
    ///
    /// The session lookup runs before cryptographic verification, so a
    /// well-formed token that was never issued, or was rotated out by a
    /// newer login, is rejected without touching the verifier. The refresh
    /// token itself is not rotated; it stays valid until its own expiry.
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshResponse, AuthError> {
        if request.refresh_token.is_empty() {
            return Err(AuthError::ValidationError(
                "Refresh token is required".to_string(),
            ));
        }

        let session = self
            .sessions
            .find_by_refresh_token(&request.refresh_token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let claims = self.tokens.verify_refresh_token(&request.refresh_token)?;

        let token = self.tokens.issue_access_token(claims.sub)?;
        tracing::debug!("Issued refreshed access token for user {}", session.user_id);
        Ok(RefreshResponse { token })
    }

    /// Resolve the user record behind a verified subject id
    pub async fn get_user(&self, user_id: i32) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        Ok(UserResponse::from(user))
    }
}

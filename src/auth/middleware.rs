// Verify-gate for protected routes
// An extractor that validates the bearer access token and attaches the
// decoded subject to the request for downstream handlers.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::auth::{error::AuthError, token::TokenService};

/// Authenticated user extractor for protected routes.
///
/// The token service comes from application state rather than ambient
/// process environment, so each test can run with its own secrets. The
/// original clients send the raw JWT in `Authorization`; a `Bearer `
/// prefix is accepted as well.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens.verify_access_token(token)?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use axum::http::Request;

    #[derive(Clone)]
    struct TestState {
        tokens: Arc<TokenService>,
    }

    impl FromRef<TestState> for Arc<TokenService> {
        fn from_ref(state: &TestState) -> Self {
            state.tokens.clone()
        }
    }

    fn test_state() -> TestState {
        TestState {
            tokens: Arc::new(TokenService::new(&AuthConfig {
                access_secret: "mw_access_secret".to_string(),
                refresh_secret: "mw_refresh_secret".to_string(),
                access_token_ttl_secs: 300,
                refresh_token_ttl_secs: 2_592_000,
            })),
        }
    }

    fn parts_with_auth(auth_value: &str) -> Parts {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, auth_value)
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        parts
    }

    fn parts_without_auth() -> Parts {
        let req = Request::builder().uri("/").body(()).unwrap();
        let (parts, _) = req.into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let state = test_state();
        let token = state.tokens.issue_access_token(42).unwrap();

        let mut parts = parts_with_auth(&token);
        let user = AuthenticatedUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, 42);
    }

    #[tokio::test]
    async fn test_bearer_prefix_is_accepted() {
        let state = test_state();
        let token = state.tokens.issue_access_token(42).unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {}", token));
        let user = AuthenticatedUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, 42);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let state = test_state();
        let mut parts = parts_without_auth();
        let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_refresh_token_is_rejected_at_the_gate() {
        // Signed with secret B; the gate only accepts secret A
        let state = test_state();
        let refresh = state.tokens.issue_refresh_token(42).unwrap();

        let mut parts = parts_with_auth(&refresh);
        let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_malformed_tokens_are_rejected() {
        let state = test_state();
        for value in ["garbage", "not.a.jwt", "Bearer still.not.ajwt"] {
            let mut parts = parts_with_auth(value);
            let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
            assert!(result.is_err());
        }
    }
}

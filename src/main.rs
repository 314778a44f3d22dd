mod auth;
mod config;
mod db;
mod error;
mod models;

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use auth::{
    login_handler, refresh_handler, register_handler, token_detail_handler, AuthService,
    AuthenticatedUser, PgSessionStore, PgUserStore, SessionStore, TokenService, UserStore,
};
use config::AppConfig;
use error::ApiError;
use models::{MessageResponse, UpdateUserRequest, UserResponse};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        auth::handlers::token_detail_handler,
        update_user,
        delete_user,
        get_user_detail,
        find_users,
    ),
    components(
        schemas(
            models::UserResponse,
            models::UpdateUserRequest,
            models::MessageResponse,
            auth::models::RegisterRequest,
            auth::models::LoginRequest,
            auth::models::RefreshRequest,
            auth::models::LoginResponse,
            auth::models::RefreshResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, token refresh and verification"),
        (name = "users", description = "User record management endpoints")
    ),
    info(
        title = "User Auth API",
        version = "1.0.0",
        description = "Credential and session authority with single-active-session semantics"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone, FromRef)]
struct AppState {
    auth: Arc<AuthService>,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenService>,
}

/// Handler for PUT /user/update
/// Updates the authenticated user's profile fields
#[utoipa::path(
    put,
    path = "/user/update",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user record", body = UserResponse),
        (status = 404, description = "User not found", body = String, example = json!({"error": "User not found!"})),
        (status = 500, description = "Update failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
async fn update_user(
    State(users): State<Arc<dyn UserStore>>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    tracing::debug!("Updating profile for user {}", user.user_id);
    payload.validate()?;

    let updated = users
        .update(user.user_id, payload.name.as_deref(), payload.email.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "User".to_string(),
            id: user.user_id.to_string(),
        })?;

    tracing::info!("Updated profile for user {}", user.user_id);
    Ok(Json(UserResponse::from(updated)))
}

/// Handler for DELETE /user/delete/:id
/// Removes the user record and its session (cascade)
#[utoipa::path(
    delete,
    path = "/user/delete/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = String, example = json!({"error": "User not found!"})),
        (status = 500, description = "Delete failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
async fn delete_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    tracing::debug!("Deleting user {}", id);

    let deleted = state.users.delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        });
    }

    // Drop the session too so the user's refresh token dies with the account
    state.sessions.delete_by_user_id(id).await?;

    tracing::info!("Deleted user {}", id);
    Ok(Json(MessageResponse {
        message: "Delete Successfully!".to_string(),
    }))
}

/// Handler for GET /user/detail/:id
/// Fetches a single user record by id
#[utoipa::path(
    get,
    path = "/user/detail/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User record", body = UserResponse),
        (status = 404, description = "User not found", body = String, example = json!({"error": "User not found!"})),
        (status = 500, description = "Lookup failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
async fn get_user_detail(
    State(users): State<Arc<dyn UserStore>>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = users.find_by_id(id).await?.ok_or_else(|| ApiError::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Handler for GET /user/find/:name
/// Case-insensitive substring search over user names
#[utoipa::path(
    get,
    path = "/user/find/{name}",
    params(("name" = String, Path, description = "Name fragment to search for")),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserResponse>),
        (status = 404, description = "No matching users", body = String, example = json!({"error": "User not found!"})),
        (status = 500, description = "Search failed", body = String, example = json!({"error": "Internal server error"}))
    ),
    security(("bearer_token" = [])),
    tag = "users"
)]
async fn find_users(
    State(users): State<Arc<dyn UserStore>>,
    _user: AuthenticatedUser,
    Path(name): Path<String>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let matches = users.find_by_name(&name).await?;
    if matches.is_empty() {
        return Err(ApiError::NotFound {
            resource: "User".to_string(),
            id: name,
        });
    }

    Ok(Json(matches.into_iter().map(UserResponse::from).collect()))
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Open endpoints
        .route("/user/register", post(register_handler))
        .route("/user/login", post(login_handler))
        .route("/user/refreshToken", post(refresh_handler))
        // Token-gated endpoints
        .route("/user/infor", get(token_detail_handler))
        .route("/user/update", put(update_user))
        .route("/user/delete/:id", delete(delete_user))
        .route("/user/detail/:id", get(get_user_detail))
        .route("/user/find/:name", get(find_users))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("User Auth API - Starting...");

    // Missing signing secrets or database URL are fatal here, before any
    // request is accepted
    let app_config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&app_config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(db_pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(db_pool));
    let tokens = Arc::new(TokenService::new(&app_config.auth));
    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        sessions.clone(),
        tokens.clone(),
    ));

    let state = AppState {
        auth: auth_service,
        users,
        sessions,
        tokens,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", app_config.host, app_config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("User Auth API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

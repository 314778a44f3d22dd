// Authentication module
// Password verification, token issuance, refresh-token rotation with
// single-active-session-per-user semantics, and token verification

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{login_handler, refresh_handler, register_handler, token_detail_handler};
pub use middleware::AuthenticatedUser;
pub use models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, Session};
pub use repository::{PgSessionStore, PgUserStore, SessionStore, UserStore};
pub use service::AuthService;
pub use token::{Claims, TokenService};

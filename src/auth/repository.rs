// Persistence for users and sessions
// The orchestrator talks to these traits; Postgres implementations back the
// running service, in-memory implementations back the test suite.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::auth::error::AuthError;
use crate::auth::models::Session;
use crate::models::User;

/// SHA-256 a refresh token before it touches storage. Lookups stay
/// exact-match: the presented token is hashed the same way first.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// User-record store consumed by the auth core and the CRUD surface
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, name: &str, email: &str, password_hash: &str)
        -> Result<User, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;
    /// Substring match on name, case-insensitive
    async fn find_by_name(&self, fragment: &str) -> Result<Vec<User>, AuthError>;
    /// Update name and/or email; omitted fields keep their current value.
    /// Returns `None` when the user does not exist.
    async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AuthError>;
    /// Returns false when the user does not exist
    async fn delete(&self, id: i32) -> Result<bool, AuthError>;
}

/// Session store enforcing the at-most-one-session-per-user invariant
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Delete any existing session for the user and persist the new refresh
    /// token as one atomic step. Concurrent logins for the same user must
    /// settle to exactly one row, last commit wins.
    async fn replace_session(&self, user_id: i32, refresh_token: &str) -> Result<(), AuthError>;
    /// Exact-match lookup; `None` for tokens never issued or rotated out
    async fn find_by_refresh_token(&self, refresh_token: &str)
        -> Result<Option<Session>, AuthError>;
    /// User-deletion cascade
    async fn delete_by_user_id(&self, user_id: i32) -> Result<(), AuthError>;
}

/// PostgreSQL-backed user store
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3)
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::EmailAlreadyExists;
                }
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users
             WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn find_by_name(&self, fragment: &str) -> Result<Vec<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users
             WHERE name ILIKE '%' || $1 || '%' ORDER BY id",
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn update(
        &self,
        id: i32,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AuthError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email)
             WHERE id = $1
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn delete(&self, id: i32) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL-backed session store
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn replace_session(&self, user_id: i32, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = hash_refresh_token(refresh_token);

        // The unique constraint on user_id turns delete-then-insert into a
        // single upsert; concurrent logins serialize on the row.
        sqlx::query(
            "INSERT INTO sessions (user_id, refresh_token_hash) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE
             SET refresh_token_hash = EXCLUDED.refresh_token_hash, created_at = NOW()",
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, AuthError> {
        let token_hash = hash_refresh_token(refresh_token);

        sqlx::query_as::<_, Session>(
            "SELECT id, user_id, refresh_token_hash, created_at FROM sessions
             WHERE refresh_token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))
    }

    async fn delete_by_user_id(&self, user_id: i32) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

/// In-memory stores used by the test suite; same contracts as the Postgres
/// implementations, serialized through a single async mutex.
#[cfg(test)]
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct UserTable {
        next_id: i32,
        rows: Vec<User>,
    }

    #[derive(Default)]
    pub struct InMemoryUserStore {
        inner: Mutex<UserTable>,
    }

    impl InMemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserStore for InMemoryUserStore {
        async fn create(
            &self,
            name: &str,
            email: &str,
            password_hash: &str,
        ) -> Result<User, AuthError> {
            let mut table = self.inner.lock().await;
            if table
                .rows
                .iter()
                .any(|u| u.email.eq_ignore_ascii_case(email))
            {
                return Err(AuthError::EmailAlreadyExists);
            }
            table.next_id += 1;
            let user = User {
                id: table.next_id,
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            };
            table.rows.push(user.clone());
            Ok(user)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
            let table = self.inner.lock().await;
            Ok(table
                .rows
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned())
        }

        async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
            let table = self.inner.lock().await;
            Ok(table.rows.iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_name(&self, fragment: &str) -> Result<Vec<User>, AuthError> {
            let table = self.inner.lock().await;
            let needle = fragment.to_lowercase();
            Ok(table
                .rows
                .iter()
                .filter(|u| u.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }

        async fn update(
            &self,
            id: i32,
            name: Option<&str>,
            email: Option<&str>,
        ) -> Result<Option<User>, AuthError> {
            let mut table = self.inner.lock().await;
            match table.rows.iter_mut().find(|u| u.id == id) {
                Some(user) => {
                    if let Some(name) = name {
                        user.name = name.to_string();
                    }
                    if let Some(email) = email {
                        user.email = email.to_string();
                    }
                    Ok(Some(user.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete(&self, id: i32) -> Result<bool, AuthError> {
            let mut table = self.inner.lock().await;
            let before = table.rows.len();
            table.rows.retain(|u| u.id != id);
            Ok(table.rows.len() < before)
        }
    }

    #[derive(Default)]
    struct SessionTable {
        next_id: i32,
        by_user: HashMap<i32, Session>,
    }

    #[derive(Default)]
    pub struct InMemorySessionStore {
        inner: Mutex<SessionTable>,
    }

    impl InMemorySessionStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn session_count(&self) -> usize {
            self.inner.lock().await.by_user.len()
        }
    }

    #[async_trait]
    impl SessionStore for InMemorySessionStore {
        async fn replace_session(
            &self,
            user_id: i32,
            refresh_token: &str,
        ) -> Result<(), AuthError> {
            // Remove-then-insert happens under one lock, so two concurrent
            // logins cannot leave zero or two rows behind.
            let mut table = self.inner.lock().await;
            table.next_id += 1;
            let session = Session {
                id: table.next_id,
                user_id,
                refresh_token_hash: hash_refresh_token(refresh_token),
                created_at: Utc::now(),
            };
            table.by_user.insert(user_id, session);
            Ok(())
        }

        async fn find_by_refresh_token(
            &self,
            refresh_token: &str,
        ) -> Result<Option<Session>, AuthError> {
            let token_hash = hash_refresh_token(refresh_token);
            let table = self.inner.lock().await;
            Ok(table
                .by_user
                .values()
                .find(|s| s.refresh_token_hash == token_hash)
                .cloned())
        }

        async fn delete_by_user_id(&self, user_id: i32) -> Result<(), AuthError> {
            let mut table = self.inner.lock().await;
            table.by_user.remove(&user_id);
            Ok(())
        }
    }
}

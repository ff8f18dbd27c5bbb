//! Credential store traits and their PostgreSQL implementation.
//!
//! The session core only talks to these traits, so the same flows run against
//! PostgreSQL in production and [`MemoryStore`](super::MemoryStore) in
//! development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::timeouts::with_default_timeout;
use crate::auth::{AuthError, AuthResult, InvalidRefreshToken, NewUser, User, UserId};
use crate::oauth::ProviderToken;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    ///
    /// Fails with `AccountAlreadyLinked` when another user holds the same
    /// `github_id`, otherwise with `UsernameTaken` on a username conflict.
    async fn create_user(&self, user: NewUser) -> AuthResult<User>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Find user by GitHub account ID
    async fn find_by_github_id(&self, github_id: i64) -> AuthResult<Option<User>>;
}

/// Trait for the revoked refresh-token denylist
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Record a refresh token identifier as revoked; duplicates are allowed
    async fn insert_invalid_refresh_token(
        &self,
        user_id: UserId,
        token_id: Uuid,
    ) -> AuthResult<InvalidRefreshToken>;

    /// Whether a denylist record exists for the pair
    async fn exists_invalid_refresh_token(
        &self,
        user_id: UserId,
        token_id: Uuid,
    ) -> AuthResult<bool>;
}

/// Trait for OAuth bookkeeping
#[async_trait]
pub trait OAuthRepository: Send + Sync {
    /// Persist a pending authorization `state`
    async fn insert_oauth_state(&self, state: &str, expires_at: DateTime<Utc>) -> AuthResult<()>;

    /// Atomically remove a pending `state`; `true` if it existed and had not expired
    async fn take_oauth_state(&self, state: &str) -> AuthResult<bool>;

    /// Store the provider token obtained for a user
    async fn save_oauth_token(&self, user_id: UserId, token: &ProviderToken) -> AuthResult<()>;
}

/// Everything the session core needs from storage
pub trait CredentialStore: UserRepository + RefreshTokenRepository + OAuthRepository {}

impl<T> CredentialStore for T where T: UserRepository + RefreshTokenRepository + OAuthRepository {}

/// Default PostgreSQL implementation of the credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, nickname, password, github_id, created_at";

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        nickname: r.get("nickname"),
        password: r.get("password"),
        github_id: r.get("github_id"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PgCredentialStore {
    async fn create_user(&self, user: NewUser) -> AuthResult<User> {
        let user = user.into_user();
        let inserted = with_default_timeout(
            sqlx::query(
                "INSERT INTO users (id, username, nickname, password, github_id, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.nickname)
            .bind(&user.password)
            .bind(user.github_id)
            .bind(user.created_at)
            .execute(&self.pool),
        )
        .await?;

        if inserted.rows_affected() == 0 {
            let linked = match user.github_id {
                Some(github_id) => self.find_by_github_id(github_id).await?.is_some(),
                None => false,
            };
            return Err(if linked {
                AuthError::AccountAlreadyLinked
            } else {
                AuthError::UsernameTaken
            });
        }

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_github_id(&self, github_id: i64) -> AuthResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE github_id = $1"))
                .bind(github_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

#[async_trait]
impl RefreshTokenRepository for PgCredentialStore {
    async fn insert_invalid_refresh_token(
        &self,
        user_id: UserId,
        token_id: Uuid,
    ) -> AuthResult<InvalidRefreshToken> {
        let record = InvalidRefreshToken {
            id: Uuid::now_v7(),
            user_id,
            token_id,
            created_at: Utc::now(),
        };

        with_default_timeout(
            sqlx::query(
                "INSERT INTO invalid_refresh_tokens (id, user_id, token_id, created_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(record.id)
            .bind(record.user_id)
            .bind(record.token_id)
            .bind(record.created_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(record)
    }

    async fn exists_invalid_refresh_token(
        &self,
        user_id: UserId,
        token_id: Uuid,
    ) -> AuthResult<bool> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT EXISTS(
                     SELECT 1 FROM invalid_refresh_tokens WHERE user_id = $1 AND token_id = $2
                 ) AS revoked",
            )
            .bind(user_id)
            .bind(token_id)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.get("revoked"))
    }
}

#[async_trait]
impl OAuthRepository for PgCredentialStore {
    async fn insert_oauth_state(&self, state: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query("INSERT INTO oauth_states (state, expires_at) VALUES ($1, $2)")
                .bind(state)
                .bind(expires_at)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn take_oauth_state(&self, state: &str) -> AuthResult<bool> {
        // expired rows are removed too, but never redeemed
        let row = with_default_timeout(
            sqlx::query(
                "DELETE FROM oauth_states WHERE state = $1 RETURNING expires_at > NOW() AS live",
            )
            .bind(state)
            .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(row.try_get::<bool, _>("live")?),
            None => Ok(false),
        }
    }

    async fn save_oauth_token(&self, user_id: UserId, token: &ProviderToken) -> AuthResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO oauth_tokens (user_id, provider, access_token, token_type, scope, created_at)
                 VALUES ($1, 'github', $2, $3, $4, NOW())
                 ON CONFLICT (user_id, provider) DO UPDATE SET
                     access_token = EXCLUDED.access_token,
                     token_type = EXCLUDED.token_type,
                     scope = EXCLUDED.scope,
                     created_at = EXCLUDED.created_at",
            )
            .bind(user_id)
            .bind(&token.access_token)
            .bind(&token.token_type)
            .bind(&token.scope)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DatabaseConfig};

    async fn store() -> PgCredentialStore {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://postgres@localhost/otodo_test".to_string());
        let config = DatabaseConfig {
            database_url,
            max_connections: 5,
            min_connections: 1,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        };

        let db = Database::new(&config)
            .await
            .expect("Failed to connect to database");
        db.migrate().await.expect("Migration failed");
        PgCredentialStore::new(db.pool().clone())
    }

    fn new_user(username: String, github_id: Option<i64>) -> NewUser {
        NewUser {
            username,
            nickname: "Test".to_string(),
            password: None,
            github_id,
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_create_user_conflicts() {
        let store = store().await;
        let suffix = Uuid::new_v4().simple().to_string();
        let github_id = i64::from(rand::random::<u32>()) + 1;

        let user = store
            .create_user(new_user(format!("pg-{suffix}"), Some(github_id)))
            .await
            .unwrap();

        assert!(matches!(
            store.create_user(new_user(format!("pg-{suffix}"), None)).await,
            Err(AuthError::UsernameTaken)
        ));
        assert!(matches!(
            store
                .create_user(new_user(format!("pg-{suffix}-2"), Some(github_id)))
                .await,
            Err(AuthError::AccountAlreadyLinked)
        ));
        assert_eq!(
            store.find_by_github_id(github_id).await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }
}

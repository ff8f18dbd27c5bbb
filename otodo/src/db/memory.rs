//! In-process credential store.
//!
//! Backs `--in-memory` development runs and the test suites. Writes are
//! serialized behind a single `RwLock`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{OAuthRepository, RefreshTokenRepository, UserRepository};
use crate::auth::{AuthError, AuthResult, InvalidRefreshToken, NewUser, User, UserId};
use crate::oauth::ProviderToken;

/// Id of the seeded `admin` account
pub const ADMIN_USER_ID: &str = "0c13da37-4593-4b2e-8163-1cbdb6e50830";

/// SHA-256 of `admin123` salted with the default password salt
const ADMIN_PASSWORD_DIGEST: &str =
    "920ee3a9befc3eb3b5b9794ba9ce4dd3044b413932d34bdceb02de900af25536";

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    invalid_refresh_tokens: Vec<InvalidRefreshToken>,
    oauth_states: HashMap<String, DateTime<Utc>>,
    oauth_tokens: HashMap<UserId, ProviderToken>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store containing the `admin` / `admin123` account
    pub fn with_seed_data() -> Self {
        let mut tables = Tables::default();
        if let (Ok(id), Ok(password)) = (
            Uuid::parse_str(ADMIN_USER_ID),
            hex::decode(ADMIN_PASSWORD_DIGEST),
        ) {
            tables.users.insert(
                id,
                User {
                    id,
                    username: "admin".to_string(),
                    nickname: "Admin".to_string(),
                    password: Some(password),
                    github_id: None,
                    created_at: Utc::now(),
                },
            );
        }

        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Number of denylist records, duplicates included
    pub async fn invalid_refresh_token_count(&self) -> usize {
        self.tables.read().await.invalid_refresh_tokens.len()
    }

    /// Provider token stored for a user, if any
    pub async fn oauth_token(&self, user_id: UserId) -> Option<ProviderToken> {
        self.tables.read().await.oauth_tokens.get(&user_id).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AuthResult<User> {
        let mut tables = self.tables.write().await;
        if user.github_id.is_some()
            && tables.users.values().any(|u| u.github_id == user.github_id)
        {
            return Err(AuthError::AccountAlreadyLinked);
        }
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }

        let user = user.into_user();
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_github_id(&self, github_id: i64) -> AuthResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.github_id == Some(github_id))
            .cloned())
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
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
        self.tables
            .write()
            .await
            .invalid_refresh_tokens
            .push(record.clone());
        Ok(record)
    }

    async fn exists_invalid_refresh_token(
        &self,
        user_id: UserId,
        token_id: Uuid,
    ) -> AuthResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .invalid_refresh_tokens
            .iter()
            .any(|r| r.user_id == user_id && r.token_id == token_id))
    }
}

#[async_trait]
impl OAuthRepository for MemoryStore {
    async fn insert_oauth_state(&self, state: &str, expires_at: DateTime<Utc>) -> AuthResult<()> {
        self.tables
            .write()
            .await
            .oauth_states
            .insert(state.to_string(), expires_at);
        Ok(())
    }

    async fn take_oauth_state(&self, state: &str) -> AuthResult<bool> {
        let expires_at = self.tables.write().await.oauth_states.remove(state);
        Ok(expires_at.is_some_and(|at| at > Utc::now()))
    }

    async fn save_oauth_token(&self, user_id: UserId, token: &ProviderToken) -> AuthResult<()> {
        self.tables
            .write()
            .await
            .oauth_tokens
            .insert(user_id, token.clone());
        Ok(())
    }
}

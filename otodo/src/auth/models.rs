//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User ID type
pub type UserId = Uuid;

/// Token type tag reported to clients
pub const TOKEN_TYPE: &str = "bearer";

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: String,
    /// `None` for accounts created through delegated login
    #[serde(skip)]
    pub password: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// User to be inserted into the credential store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub nickname: String,
    pub password: Option<Vec<u8>>,
    pub github_id: Option<i64>,
}

impl NewUser {
    /// Materialize the record with a fresh, time-sortable id
    pub fn into_user(self) -> User {
        User {
            id: Uuid::now_v7(),
            username: self.username,
            nickname: self.nickname,
            password: self.password,
            github_id: self.github_id,
            created_at: Utc::now(),
        }
    }
}

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user_name: String,
    pub password: String,
    pub nickname: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

/// Denylist entry for a revoked refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidRefreshToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Tokens returned by login, OAuth login and access-token renewal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenResult {
    pub access_token: String,
    pub token_type: String,
    /// Access-token lifetime in seconds
    pub expires_in: i64,
    /// Present on login only; renewal never rotates the refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Claims shared by every session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,           // User ID
    pub iat: i64,              // Issued at timestamp
    pub exp: i64,              // Expiration timestamp
}

impl TokenClaims {
    pub fn new(user_id: UserId, issued_at: i64, lifetime_secs: i64) -> Self {
        Self {
            sub: user_id,
            iat: issued_at,
            exp: issued_at + lifetime_secs,
        }
    }
}

/// JWT claims for refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(flatten)]
    pub base: TokenClaims,
    /// Unique refresh-token identifier, the denylist key
    pub jti: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// JWT claims for access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(flatten)]
    pub base: TokenClaims,
    /// Identifier of the refresh token this access token was derived from
    pub rti: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// Claim shapes the token codec can sign and verify
pub trait SessionClaims: Serialize + serde::de::DeserializeOwned {
    fn base(&self) -> &TokenClaims;
}

impl SessionClaims for RefreshClaims {
    fn base(&self) -> &TokenClaims {
        &self.base
    }
}

impl SessionClaims for AccessClaims {
    fn base(&self) -> &TokenClaims {
        &self.base
    }
}

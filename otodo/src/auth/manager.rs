//! Session manager implementation.
//!
//! Every refresh-token lineage moves through
//! `Issued -> Active -> {Renewed | Revoked | Expired}`. Nothing about a
//! lineage is kept in memory: revocation lives in the credential store's
//! denylist and expiry lives inside the signed tokens.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    config::SessionConfig,
    errors::{AuthError, AuthResult},
    models::{
        AccessClaims, AuthTokenResult, LoginRequest, NewUser, RefreshClaims, RegisterRequest,
        TOKEN_TYPE, TokenClaims, User, UserId,
    },
    password::PasswordHasher,
    token::{TokenCodec, parse_bearer},
};
use crate::db::CredentialStore;

/// Session manager
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    access_token_lifetime_secs: i64,
    refresh_token_lifetime_secs: i64,
    access_token_refresh_threshold_secs: i64,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `store` - Credential store holding users and the refresh-token denylist
    /// * `config` - Signing secret, password salt and token lifetimes
    pub fn new(store: Arc<dyn CredentialStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            codec: TokenCodec::new(&config.jwt_secret),
            hasher: PasswordHasher::new(&config.password_salt),
            access_token_lifetime_secs: config.access_token_lifetime_secs,
            refresh_token_lifetime_secs: config.refresh_token_lifetime_secs,
            access_token_refresh_threshold_secs: config.access_token_refresh_threshold_secs,
        }
    }

    /// Token codec used to sign and verify session tokens
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Register a new password account
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::WeakPassword` - Password too short
    /// * `AuthError::UsernameTaken` - Username already exists
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        validate_username(&request.user_name)?;
        validate_password(&request.password)?;

        let nickname = match request.nickname.trim() {
            "" => request.user_name.clone(),
            nickname => nickname.to_string(),
        };

        let user = self
            .store
            .create_user(NewUser {
                password: Some(self.hasher.hash(&request.password)),
                username: request.user_name,
                nickname,
                github_id: None,
            })
            .await?;

        log::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Login with username and password
    ///
    /// Unknown usernames, accounts without a password and wrong passwords all
    /// fail with the same `AuthError::InvalidCredential`.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<AuthTokenResult> {
        let user = self
            .store
            .find_by_username(&request.user_name)
            .await?
            .ok_or(AuthError::InvalidCredential)?;

        let digest = user.password.as_deref().ok_or(AuthError::InvalidCredential)?;
        if !self.hasher.verify(&request.password, digest) {
            return Err(AuthError::InvalidCredential);
        }

        self.mint_session(&user)
    }

    /// Mint a fresh refresh token and an access token bound to it
    ///
    /// This is the login-success path shared by password and OAuth login.
    pub fn mint_session(&self, user: &User) -> AuthResult<AuthTokenResult> {
        let now = Utc::now().timestamp();
        let refresh_claims = RefreshClaims {
            base: TokenClaims::new(user.id, now, self.refresh_token_lifetime_secs),
            jti: Uuid::new_v4(),
            nickname: Some(user.nickname.clone()),
        };
        let refresh_token = self.codec.sign(&refresh_claims)?;
        let access_token = self.sign_access_token(user, refresh_claims.jti, now)?;

        log::debug!(
            "Issued refresh token {} for user {}",
            refresh_claims.jti,
            user.id
        );

        Ok(AuthTokenResult {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.access_token_lifetime_secs,
            refresh_token: Some(refresh_token),
        })
    }

    /// Revoke a refresh token identifier
    ///
    /// Repeated calls only add duplicate denylist records. Access tokens
    /// already minted from this identifier stay valid until their own expiry.
    pub async fn logout(&self, user_id: UserId, refresh_token_id: Uuid) -> AuthResult<()> {
        self.store
            .insert_invalid_refresh_token(user_id, refresh_token_id)
            .await?;
        log::info!("Revoked refresh token {} of user {}", refresh_token_id, user_id);
        Ok(())
    }

    /// Whether the refresh token identifier has not been revoked
    ///
    /// Does not look at expiry; callers verify the token first.
    pub async fn is_valid_refresh_token(
        &self,
        user_id: UserId,
        refresh_token_id: Uuid,
    ) -> AuthResult<bool> {
        let revoked = self
            .store
            .exists_invalid_refresh_token(user_id, refresh_token_id)
            .await?;
        Ok(!revoked)
    }

    /// Mint a new access token bound to an existing refresh token identifier
    ///
    /// The refresh token itself is not rotated and is absent from the result.
    ///
    /// # Errors
    ///
    /// * `AuthError::Revoked` - The identifier is denylisted
    /// * `AuthError::UserNotFound` - The user disappeared after issuance
    pub async fn renew_access_token(
        &self,
        user_id: UserId,
        refresh_token_id: Uuid,
    ) -> AuthResult<AuthTokenResult> {
        if !self.is_valid_refresh_token(user_id, refresh_token_id).await? {
            return Err(AuthError::Revoked);
        }

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access_token =
            self.sign_access_token(&user, refresh_token_id, Utc::now().timestamp())?;

        Ok(AuthTokenResult {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.access_token_lifetime_secs,
            refresh_token: None,
        })
    }

    /// Exchange a refresh token string for a new access token
    ///
    /// The token is verified (parse, signature, expiry) before the denylist is
    /// ever consulted.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthTokenResult> {
        let claims = self.codec.verify::<RefreshClaims>(refresh_token)?;
        self.renew_access_token(claims.base.sub, claims.jti).await
    }

    /// Verify the access token carried by an `Authorization` header value
    pub fn authenticate(&self, authorization: &str) -> AuthResult<AccessClaims> {
        let token = parse_bearer(authorization).ok_or(AuthError::MalformedToken)?;
        Ok(self.codec.verify::<AccessClaims>(token)?)
    }

    /// Whether an access token is close enough to expiry to renew it
    pub fn should_refresh_access_token(&self, claims: &AccessClaims) -> bool {
        self.should_refresh_access_token_at(claims, Utc::now().timestamp())
    }

    /// [`should_refresh_access_token`](Self::should_refresh_access_token) against an explicit clock
    pub fn should_refresh_access_token_at(&self, claims: &AccessClaims, now: i64) -> bool {
        if claims.base.exp == 0 {
            return false;
        }
        now + self.access_token_refresh_threshold_secs >= claims.base.exp
    }

    /// Load the user behind a verified token
    pub async fn current_user(&self, user_id: UserId) -> AuthResult<User> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    fn sign_access_token(
        &self,
        user: &User,
        refresh_token_id: Uuid,
        now: i64,
    ) -> AuthResult<String> {
        let claims = AccessClaims {
            base: TokenClaims::new(user.id, now, self.access_token_lifetime_secs),
            rti: refresh_token_id,
            nickname: Some(user.nickname.clone()),
        };
        Ok(self.codec.sign(&claims)?)
    }
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.len();
    if !(3..=32).contains(&len) {
        return Err(AuthError::InvalidUsername(
            "Username must be 3-32 characters".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AuthError::InvalidUsername(
            "Username can only contain letters, numbers, underscores and hyphens".to_string(),
        ));
    }

    Ok(())
}

/// Validate password strength
fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < 8 {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

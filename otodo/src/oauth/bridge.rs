//! Delegated login through the OAuth provider.
//!
//! `RedirectIssued -> CodeReceived -> TokenExchanged -> ProfileFetched ->
//! UserResolved -> SessionMinted`. Issued `state` values are persisted and
//! redeemed once, so a callback that did not start here is rejected.

use chrono::{Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::{
    config::OAuthConfig,
    provider::{OAuthProvider, ProviderProfile, ProviderToken},
    worker::{PersistenceHandle, PersistenceJob, PersistenceWorker},
};
use crate::auth::{AuthError, AuthResult, AuthTokenResult, NewUser, SessionManager, User};
use crate::db::CredentialStore;

/// Usernames tried for a new provider account before giving up
const MAX_USERNAME_ATTEMPTS: usize = 5;

/// OAuth login bridge
#[derive(Clone)]
pub struct OAuthBridge {
    provider: Arc<dyn OAuthProvider>,
    store: Arc<dyn CredentialStore>,
    sessions: SessionManager,
    persistence: PersistenceHandle,
    request_timeout: Duration,
    state_ttl: ChronoDuration,
}

impl OAuthBridge {
    /// Create a bridge and start its token-persistence worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn CredentialStore>,
        sessions: SessionManager,
        config: &OAuthConfig,
    ) -> Self {
        let persistence = PersistenceWorker::spawn(store.clone());
        Self {
            provider,
            store,
            sessions,
            persistence,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            state_ttl: ChronoDuration::seconds(config.state_ttl_secs),
        }
    }

    /// Build the provider authorization URL and remember its `state`
    pub async fn create_authorization_uri(&self) -> AuthResult<String> {
        let state = hex::encode(rand::random::<[u8; 16]>());
        self.store
            .insert_oauth_state(&state, Utc::now() + self.state_ttl)
            .await?;
        self.provider.authorization_uri(&state)
    }

    /// Exchange an authorization code, failing closed on timeout
    pub async fn exchange_code(&self, code: &str, state: &str) -> AuthResult<ProviderToken> {
        self.with_deadline(self.provider.exchange_code(code, state), || {
            AuthError::ExchangeError("token endpoint timed out".to_string())
        })
        .await
    }

    /// Fetch the provider profile, failing closed on timeout
    pub async fn fetch_profile(&self, token: &ProviderToken) -> AuthResult<ProviderProfile> {
        self.with_deadline(self.provider.fetch_profile(token), || {
            AuthError::ProfileFetchError("user endpoint timed out".to_string())
        })
        .await
    }

    /// Find the local user linked to a provider account, creating it on first login
    ///
    /// New accounts take the provider login as username and have no password.
    /// A taken username is retried as `{login}-{id}`, then with a random
    /// suffix. When a concurrent login links the account first, that user
    /// is returned.
    pub async fn resolve_user(&self, profile: &ProviderProfile) -> AuthResult<User> {
        if let Some(user) = self.store.find_by_github_id(profile.id).await? {
            return Ok(user);
        }

        let nickname = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&profile.login)
            .to_string();
        let new_user = |username: String| NewUser {
            username,
            nickname: nickname.clone(),
            password: None,
            github_id: Some(profile.id),
        };

        for attempt in 0..MAX_USERNAME_ATTEMPTS {
            let username = match attempt {
                0 => profile.login.clone(),
                1 => format!("{}-{}", profile.login, profile.id),
                _ => format!(
                    "{}-{}-{}",
                    profile.login,
                    profile.id,
                    hex::encode(rand::random::<[u8; 3]>())
                ),
            };

            match self.store.create_user(new_user(username)).await {
                Ok(user) => {
                    log::info!(
                        "Created user {} ({}) from GitHub account {}",
                        user.username,
                        user.id,
                        profile.id
                    );
                    return Ok(user);
                }
                Err(AuthError::UsernameTaken) => continue,
                Err(AuthError::AccountAlreadyLinked) => {
                    return self
                        .store
                        .find_by_github_id(profile.id)
                        .await?
                        .ok_or(AuthError::AccountAlreadyLinked);
                }
                Err(e) => return Err(e),
            }
        }

        log::warn!(
            "No free username for GitHub account {} after {} attempts",
            profile.id,
            MAX_USERNAME_ATTEMPTS
        );
        Err(AuthError::UsernameTaken)
    }

    /// Complete the callback: redeem `state`, exchange, resolve and mint a session
    pub async fn login(&self, code: &str, state: &str) -> AuthResult<AuthTokenResult> {
        if !self.store.take_oauth_state(state).await? {
            return Err(AuthError::InvalidOAuthState);
        }

        let token = self.exchange_code(code, state).await?;
        let profile = self.fetch_profile(&token).await?;
        let user = self.resolve_user(&profile).await?;

        self.persistence.enqueue(PersistenceJob::SaveOAuthToken {
            user_id: user.id,
            token,
        });

        self.sessions.mint_session(&user)
    }

    async fn with_deadline<T, F>(
        &self,
        future: F,
        on_timeout: impl FnOnce() -> AuthError,
    ) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        match tokio::time::timeout(self.request_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout()),
        }
    }
}

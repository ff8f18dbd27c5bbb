//! GitHub OAuth 2.0 provider.
//!
//! Two round-trips: the authorization code is exchanged at the token
//! endpoint, then the resulting token reads the account from the user API.

use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::OAuthConfig;
use crate::auth::{AuthError, AuthResult};

/// Access token issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
}

/// Account as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Stable provider account id
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
}

/// A delegated-login provider
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Provider authorization URL carrying `state`
    fn authorization_uri(&self, state: &str) -> AuthResult<String>;

    /// Exchange an authorization code for a provider token
    async fn exchange_code(&self, code: &str, state: &str) -> AuthResult<ProviderToken>;

    /// Read the account behind a provider token
    async fn fetch_profile(&self, token: &ProviderToken) -> AuthResult<ProviderProfile>;
}

/// GitHub token endpoint response; errors come back as 200 with `error` set
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    #[serde(default)]
    scope: String,
    error: Option<String>,
    error_description: Option<String>,
}

/// GitHub OAuth provider
pub struct GithubProvider {
    config: OAuthConfig,
    http: Client,
}

impl GithubProvider {
    pub fn new(config: OAuthConfig) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("otodo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AuthError::OAuthMisconfigured(format!("HTTP client setup failed: {e}"))
            })?;

        Ok(Self { config, http })
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn authorization_uri(&self, state: &str) -> AuthResult<String> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("scope", "read:user"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::OAuthMisconfigured(format!("Invalid authorize URL: {e}")))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, state: &str) -> AuthResult<ProviderToken> {
        let response: TokenEndpointResponse = self
            .http
            .post(&self.config.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("state", state),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::ExchangeError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::ExchangeError(e.to_string()))?;

        if let Some(error) = response.error {
            let detail = response.error_description.unwrap_or_default();
            return Err(AuthError::ExchangeError(format!("{error}: {detail}")));
        }

        let access_token = response
            .access_token
            .ok_or_else(|| AuthError::ExchangeError("missing access_token".to_string()))?;

        Ok(ProviderToken {
            access_token,
            token_type: response.token_type.unwrap_or_else(|| "bearer".to_string()),
            scope: response.scope,
        })
    }

    async fn fetch_profile(&self, token: &ProviderToken) -> AuthResult<ProviderProfile> {
        self.http
            .get(&self.config.user_api_url)
            .bearer_auth(&token.access_token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::ProfileFetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetchError(e.to_string()))
    }
}

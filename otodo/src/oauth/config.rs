//! OAuth provider configuration from environment variables.

use std::env;

/// GitHub OAuth application settings
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where the provider sends the user back with `code` and `state`
    pub callback_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub user_api_url: String,
    /// Deadline for each provider round-trip
    pub request_timeout_secs: u64,
    /// How long an issued `state` stays redeemable
    pub state_ttl_secs: i64,
}

impl OAuthConfig {
    /// GitHub endpoints with the given application credentials
    pub fn github(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: callback_url.into(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            user_api_url: "https://api.github.com/user".to_string(),
            request_timeout_secs: 10,
            state_ttl_secs: 10 * 60,
        }
    }

    /// Load GitHub settings from the environment
    ///
    /// Returns `None` when `GITHUB_CLIENT_ID` or `GITHUB_CLIENT_SECRET` is
    /// unset, which disables delegated login. `GITHUB_CALLBACK_URL` and
    /// `OAUTH_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Option<Self> {
        let client_id = env::var("GITHUB_CLIENT_ID").ok()?;
        let client_secret = env::var("GITHUB_CLIENT_SECRET").ok()?;
        let callback_url = env::var("GITHUB_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:8080/oauth/github/callback".to_string());

        let mut config = Self::github(client_id, client_secret, callback_url);
        if let Some(secs) = env::var("OAUTH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.request_timeout_secs = secs;
        }
        Some(config)
    }
}

//! Session configuration.
//!
//! Lifetimes and secrets are carried explicitly into [`SessionManager`](super::SessionManager)
//! and the token codec at construction time.

use std::env;

/// Default access-token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: i64 = 15 * 60;

/// Default refresh-token lifetime (15 days)
pub const DEFAULT_REFRESH_TOKEN_LIFETIME_SECS: i64 = 15 * 24 * 60 * 60;

/// Default window before access-token expiry in which renewal is suggested (5 minutes)
pub const DEFAULT_ACCESS_TOKEN_REFRESH_THRESHOLD_SECS: i64 = 5 * 60;

/// Salt the seeded development digests were produced with
pub const DEFAULT_PASSWORD_SALT: &str = "test_nonce";

/// Session token and password hashing configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Shared HS256 signing secret
    pub jwt_secret: String,

    /// Process-wide password salt
    pub password_salt: String,

    /// Access-token lifetime in seconds
    pub access_token_lifetime_secs: i64,

    /// Refresh-token lifetime in seconds
    pub refresh_token_lifetime_secs: i64,

    /// Renewal threshold in seconds
    pub access_token_refresh_threshold_secs: i64,
}

impl SessionConfig {
    /// Create a configuration with default lifetimes
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            password_salt: DEFAULT_PASSWORD_SALT.to_string(),
            access_token_lifetime_secs: DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
            refresh_token_lifetime_secs: DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
            access_token_refresh_threshold_secs: DEFAULT_ACCESS_TOKEN_REFRESH_THRESHOLD_SECS,
        }
    }

    /// Overlay lifetimes and salt from the environment
    ///
    /// Reads `PASSWORD_SALT`, `ACCESS_TOKEN_LIFETIME_SECS`,
    /// `REFRESH_TOKEN_LIFETIME_SECS` and `ACCESS_TOKEN_REFRESH_THRESHOLD_SECS`;
    /// anything missing or unparsable keeps its current value.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(salt) = env::var("PASSWORD_SALT") {
            self.password_salt = salt;
        }
        self.access_token_lifetime_secs =
            parse_env_or("ACCESS_TOKEN_LIFETIME_SECS", self.access_token_lifetime_secs);
        self.refresh_token_lifetime_secs =
            parse_env_or("REFRESH_TOKEN_LIFETIME_SECS", self.refresh_token_lifetime_secs);
        self.access_token_refresh_threshold_secs = parse_env_or(
            "ACCESS_TOKEN_REFRESH_THRESHOLD_SECS",
            self.access_token_refresh_threshold_secs,
        );
        self
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetimes() {
        let config = SessionConfig::new("secret");
        assert_eq!(config.access_token_lifetime_secs, 900);
        assert_eq!(config.refresh_token_lifetime_secs, 1_296_000);
        assert_eq!(config.access_token_refresh_threshold_secs, 300);
        assert_eq!(config.password_salt, "test_nonce");
    }
}

//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use otodo::{OAuthConfig, SessionConfig, db::DatabaseConfig};
use std::net::SocketAddr;

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Signing secret used by `--in-memory` runs without `JWT_SECRET`
const DEVELOPMENT_JWT_SECRET: &str = "development_jwt_secret_do_not_deploy";

/// Minimum signing secret length outside of `--in-memory` runs
const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration, unused with `in_memory`
    pub database: DatabaseConfig,
    /// Token signing and password hashing configuration
    pub session: SessionConfig,
    /// GitHub login; `None` disables delegated login
    pub oauth: Option<OAuthConfig>,
    /// Keep credentials in process memory instead of PostgreSQL
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `in_memory` - Whether the in-memory credential store is used
    ///
    /// # Errors
    ///
    /// Returns error if `JWT_SECRET` is missing (outside `in_memory` runs) or
    /// if `SERVER_BIND` cannot be parsed.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        in_memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => std::env::var("SERVER_BIND")
                .unwrap_or_else(|_| DEFAULT_BIND.to_string())
                .parse()
                .map_err(|e| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("{e}"),
                })?,
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(database_url) = database_url_override {
            database.database_url = database_url;
        }

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if in_memory => {
                tracing::warn!("JWT_SECRET not set, using the development signing secret");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
            Err(_) => {
                return Err(ConfigError::MissingRequired {
                    var: "JWT_SECRET".to_string(),
                    hint: "Generate with: openssl rand -hex 32".to_string(),
                });
            }
        };

        Ok(ServerConfig {
            bind,
            database,
            session: SessionConfig::new(jwt_secret).with_env_overrides(),
            oauth: OAuthConfig::from_env(),
            in_memory,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session;

        if !self.in_memory && session.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        if session.access_token_refresh_threshold_secs < 0 {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_REFRESH_THRESHOLD_SECS".to_string(),
                reason: "Must not be negative".to_string(),
            });
        }

        if session.access_token_lifetime_secs <= session.access_token_refresh_threshold_secs {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_LIFETIME_SECS".to_string(),
                reason: format!(
                    "Must be greater than the refresh threshold ({})",
                    session.access_token_refresh_threshold_secs
                ),
            });
        }

        if session.refresh_token_lifetime_secs <= session.access_token_lifetime_secs {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_LIFETIME_SECS".to_string(),
                reason: format!(
                    "Must be greater than the access token lifetime ({})",
                    session.access_token_lifetime_secs
                ),
            });
        }

        if self
            .oauth
            .as_ref()
            .is_some_and(|oauth| oauth.request_timeout_secs == 0)
        {
            return Err(ConfigError::Invalid {
                var: "OAUTH_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig::development(),
            session: SessionConfig::new("a".repeat(32)),
            oauth: None,
            in_memory: false,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_default_lifetimes_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected_unless_in_memory() {
        let mut config = config();
        config.session.jwt_secret = "short".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { var, .. }) if var == "JWT_SECRET"
        ));

        config.in_memory = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_must_be_below_access_lifetime() {
        let mut config = config();
        config.session.access_token_refresh_threshold_secs =
            config.session.access_token_lifetime_secs;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_LIFETIME_SECS"));
    }

    #[test]
    fn test_refresh_lifetime_must_exceed_access_lifetime() {
        let mut config = config();
        config.session.refresh_token_lifetime_secs = 60;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("REFRESH_TOKEN_LIFETIME_SECS"));
    }

    #[test]
    fn test_oauth_timeout_must_be_positive() {
        let mut config = config();
        let mut oauth = OAuthConfig::github("id", "secret", "http://localhost/callback");
        oauth.request_timeout_secs = 0;
        config.oauth = Some(oauth);

        assert!(config.validate().is_err());
    }
}

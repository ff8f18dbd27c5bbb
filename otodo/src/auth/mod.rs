//! Authentication module providing password login and the session token lifecycle.
//!
//! This module implements:
//! - Salted SHA-256 password digests
//! - HS256 JWT access tokens (15-minute expiry) bound to a refresh-token identifier
//! - Refresh tokens (15-day expiry) revocable through an identifier denylist
//! - Access-token renewal without re-authentication
//!
//! ## Example
//!
//! ```no_run
//! use otodo::auth::{LoginRequest, SessionConfig, SessionManager};
//! use otodo::db::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sessions = SessionManager::new(
//!         Arc::new(MemoryStore::with_seed_data()),
//!         &SessionConfig::new("jwt_secret"),
//!     );
//!
//!     let tokens = sessions
//!         .login(LoginRequest {
//!             user_name: "admin".to_string(),
//!             password: "admin123".to_string(),
//!         })
//!         .await?;
//!
//!     let renewed = sessions
//!         .refresh(tokens.refresh_token.as_deref().unwrap_or_default())
//!         .await?;
//!     println!("new access token expires in {}s", renewed.expires_in);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod token;

pub use config::SessionConfig;
pub use errors::{AuthError, AuthResult, TokenError};
pub use manager::SessionManager;
pub use models::{
    AccessClaims, AuthTokenResult, InvalidRefreshToken, LoginRequest, NewUser, RefreshClaims,
    RegisterRequest, SessionClaims, TOKEN_TYPE, TokenClaims, User, UserId,
};
pub use password::PasswordHasher;
pub use token::{TokenCodec, Verified, parse_bearer};

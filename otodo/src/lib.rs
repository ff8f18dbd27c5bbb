//! # otodo
//!
//! Session and delegated-login core of the otodo to-do backend.
//!
//! Clients authenticate with a username/password or through GitHub and receive
//! a pair of signed tokens: a short-lived access token presented on every
//! request, and a long-lived refresh token used only to mint new access
//! tokens. Access tokens are verified statelessly; logout denylists the
//! refresh token's identifier so no further access tokens can be derived
//! from it.
//!
//! ## Core Modules
//!
//! - [`auth`]: password digests, token codec, and the [`SessionManager`]
//! - [`oauth`]: the GitHub authorization-code flow ([`OAuthBridge`])
//! - [`db`]: credential store traits with PostgreSQL and in-memory backends
//!
//! ## Example
//!
//! ```
//! use otodo::auth::{SessionConfig, SessionManager};
//! use otodo::db::MemoryStore;
//! use std::sync::Arc;
//!
//! let sessions = SessionManager::new(
//!     Arc::new(MemoryStore::with_seed_data()),
//!     &SessionConfig::new("jwt_secret"),
//! );
//! # let _ = sessions;
//! ```

/// Password login and the session token lifecycle.
pub mod auth;
pub use auth::{AuthError, AuthResult, AuthTokenResult, SessionConfig, SessionManager};

/// Credential storage.
pub mod db;

/// GitHub delegated login.
pub mod oauth;
pub use oauth::{OAuthBridge, OAuthConfig};

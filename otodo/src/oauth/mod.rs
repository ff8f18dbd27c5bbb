//! Delegated login through GitHub OAuth 2.0.
//!
//! - [`OAuthBridge`]: authorization URL, callback handling, local user resolution
//! - [`GithubProvider`]: the two provider round-trips
//! - [`PersistenceWorker`]: detached storage of provider tokens

pub mod bridge;
pub mod config;
pub mod provider;
pub mod worker;

pub use bridge::OAuthBridge;
pub use config::OAuthConfig;
pub use provider::{GithubProvider, OAuthProvider, ProviderProfile, ProviderToken};
pub use worker::{PersistenceHandle, PersistenceJob, PersistenceWorker};

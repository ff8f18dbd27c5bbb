//! Authentication error types.

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Token codec failures, in verification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not a three-part token, bad encoding, or wrong claim shape
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match the payload
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// Authentic token past its expiry
    #[error("Token expired")]
    Expired,

    /// Claims could not be signed
    #[error("Token signing failed")]
    SigningFailed,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password; deliberately indistinguishable
    #[error("Invalid credential")]
    InvalidCredential,

    /// Token could not be parsed into the expected claim shape
    #[error("Malformed token")]
    MalformedToken,

    /// Token signature check failed
    #[error("Invalid token signature")]
    SignatureInvalid,

    /// Token is past its expiry
    #[error("Token expired")]
    Expired,

    /// Refresh token identifier has been denylisted
    #[error("Refresh token has been revoked")]
    Revoked,

    /// User referenced by a token no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// Provider account is already linked to a user
    #[error("Provider account already linked")]
    AccountAlreadyLinked,

    /// Invalid username format
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Password too weak
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    /// OAuth authorization code exchange failed
    #[error("OAuth code exchange failed: {0}")]
    ExchangeError(String),

    /// OAuth profile fetch failed
    #[error("OAuth profile fetch failed: {0}")]
    ProfileFetchError(String),

    /// OAuth `state` unknown, already used, or expired
    #[error("Invalid or expired OAuth state")]
    InvalidOAuthState,

    /// OAuth provider is not configured
    #[error("OAuth login is not configured")]
    OAuthDisabled,

    /// OAuth provider settings are unusable (bad URL, HTTP client setup)
    #[error("OAuth provider misconfigured: {0}")]
    OAuthMisconfigured(String),

    /// Credential store unavailable
    #[error("Storage error: {0}")]
    Storage(#[from] TimeoutError),

    /// Token signing failed
    #[error("Token signing failed")]
    SigningFailed,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => AuthError::MalformedToken,
            TokenError::SignatureInvalid => AuthError::SignatureInvalid,
            TokenError::Expired => AuthError::Expired,
            TokenError::SigningFailed => AuthError::SigningFailed,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Storage(TimeoutError::Database(err))
    }
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage and provider errors are collapsed so that neither SQL details
    /// nor upstream responses reach the client.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Storage(_)
            | AuthError::SigningFailed
            | AuthError::OAuthMisconfigured(_) => "Internal server error".to_string(),
            AuthError::ExchangeError(_) => "OAuth code exchange failed".to_string(),
            AuthError::ProfileFetchError(_) => "OAuth profile fetch failed".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error is a credential or token rejection
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredential
                | AuthError::MalformedToken
                | AuthError::SignatureInvalid
                | AuthError::Expired
                | AuthError::Revoked
                | AuthError::UserNotFound
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

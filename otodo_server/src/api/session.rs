//! Session API handlers.
//!
//! Login with a username and password, renew the access token with a refresh
//! token, and log out by revoking the refresh token the access token came from.
//!
//! # Examples
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/session \
//!   -H "Content-Type: application/json" \
//!   -d '{"user_name": "admin", "password": "admin123"}'
//! ```
//!
//! Refresh:
//! ```bash
//! curl -X POST http://localhost:8080/api/session/token \
//!   -H "Content-Type: application/json" \
//!   -d '{"refresh_token": "eyJhbGciOiJIUzI1NiIs..."}'
//! ```

use axum::{Extension, Json, extract::State, http::StatusCode};
use otodo::auth::{AccessClaims, AuthError, AuthTokenResult, LoginRequest};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiJson, AppState, error_response, request_id::RequestId};
use crate::logging::log_security_event;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub timestamp: String,
}

/// Liveness check for clients
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Authenticate with username and password.
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiIs...",
///   "token_type": "bearer",
///   "expires_in": 900,
///   "refresh_token": "eyJhbGciOiJIUzI1NiIs..."
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthTokenResult>, ApiError> {
    let user_name = payload.user_name.clone();

    match state.sessions.login(payload).await {
        Ok(tokens) => Ok(Json(tokens)),
        Err(e) => {
            if matches!(e, AuthError::InvalidCredential) {
                log_security_event(
                    "failed_login",
                    None,
                    Some(request_id.as_str()),
                    &format!("Invalid credential for user {user_name}"),
                );
            }
            Err(error_response(e))
        }
    }
}

/// Log out the session the access token belongs to.
///
/// Always acknowledges with `204 No Content`; a failure to record the
/// revocation is only logged.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> StatusCode {
    if let Err(e) = state.sessions.logout(claims.base.sub, claims.rti).await {
        tracing::error!(
            user_id = %claims.base.sub,
            refresh_token_id = %claims.rti,
            "Failed to revoke refresh token: {}",
            e
        );
    }

    StatusCode::NO_CONTENT
}

/// Exchange a refresh token for a new access token.
///
/// The refresh token is not rotated, so the response has no `refresh_token`.
///
/// # Errors
///
/// - `401 Unauthorized`: Malformed, forged, expired or revoked refresh token,
///   or the user no longer exists
pub async fn refresh(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthTokenResult>, ApiError> {
    match state.sessions.refresh(&payload.refresh_token).await {
        Ok(tokens) => Ok(Json(tokens)),
        Err(e) => {
            if matches!(e, AuthError::Revoked | AuthError::SignatureInvalid) {
                log_security_event(
                    "rejected_refresh",
                    None,
                    Some(request_id.as_str()),
                    &e.to_string(),
                );
            }
            Err(error_response(e))
        }
    }
}

//! GitHub delegated-login handlers.
//!
//! The client first asks for the authorization URL, sends the user there,
//! and posts the `code` and `state` GitHub hands back to the callback.

use axum::{Json, extract::State};
use otodo::{AuthError, AuthTokenResult, OAuthBridge};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiJson, AppState, error_response};

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub code: String,
    pub state: String,
}

fn bridge(state: &AppState) -> Result<&Arc<OAuthBridge>, ApiError> {
    state
        .oauth
        .as_ref()
        .ok_or_else(|| error_response(AuthError::OAuthDisabled))
}

/// GitHub authorization URL with a freshly issued `state`
///
/// # Errors
///
/// - `404 Not Found`: GitHub login is not configured
pub async fn authorize(State(state): State<AppState>) -> Result<Json<AuthorizeResponse>, ApiError> {
    let redirect_uri = bridge(&state)?
        .create_authorization_uri()
        .await
        .map_err(error_response)?;

    Ok(Json(AuthorizeResponse { redirect_uri }))
}

/// Complete GitHub login and mint a session
///
/// # Errors
///
/// - `400 Bad Request`: Unknown, reused or expired `state`
/// - `502 Bad Gateway`: GitHub rejected the code or did not answer in time
pub async fn callback(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CallbackRequest>,
) -> Result<Json<AuthTokenResult>, ApiError> {
    let tokens = bridge(&state)?
        .login(&payload.code, &payload.state)
        .await
        .map_err(error_response)?;

    Ok(Json(tokens))
}

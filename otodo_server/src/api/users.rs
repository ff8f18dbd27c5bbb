//! User API handlers.

use axum::{Extension, Json, extract::State, http::StatusCode};
use otodo::auth::{AccessClaims, RegisterRequest, User};

use super::{ApiError, ApiJson, AppState, error_response};

/// Register a new password account.
///
/// # Request Body
///
/// ```json
/// {
///   "user_name": "carol",
///   "password": "Sup3rSecret",
///   "nickname": "Carol"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid username or weak password
/// - `409 Conflict`: Username already taken
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .sessions
        .register(payload)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// The user behind the presented access token
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .sessions
        .current_user(claims.base.sub)
        .await
        .map_err(error_response)?;

    Ok(Json(user))
}

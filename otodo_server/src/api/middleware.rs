//! Authentication middleware for protected endpoints.
//!
//! Verifies the bearer access token and injects its [`AccessClaims`] into
//! request extensions. Handlers extract them with
//! `Extension(claims): Extension<AccessClaims>`.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use otodo::auth::{AccessClaims, AuthError};

use super::{ApiError, AppState, ErrorResponse, error_response, request_id::RequestId};
use crate::logging::log_security_event;

/// Response header carrying a renewed access token
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Authentication middleware that validates the access token
///
/// # Behavior
///
/// - **Missing header**: `401 Unauthorized`
/// - **Malformed, forged or expired token**: `401 Unauthorized`
/// - **Valid token**: claims injected, handler runs. If the token is within
///   the renewal threshold of its expiry, a new access token derived from the
///   same refresh token is attached as `x-access-token`. A revoked lineage
///   simply gets no header.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request.extensions().get::<RequestId>().cloned();

    let Some(authorization) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Missing access token".to_string(),
            }),
        ));
    };

    let claims = match state.sessions.authenticate(authorization) {
        Ok(claims) => claims,
        Err(e) => {
            if matches!(e, AuthError::SignatureInvalid) {
                log_security_event(
                    "forged_access_token",
                    None,
                    request_id.as_ref().map(RequestId::as_str),
                    "Access token signature mismatch",
                );
            }
            return Err(error_response(e));
        }
    };

    request.extensions_mut().insert(claims.clone());
    let mut response = next.run(request).await;

    if state.sessions.should_refresh_access_token(&claims) {
        match state
            .sessions
            .renew_access_token(claims.base.sub, claims.rti)
            .await
        {
            Ok(renewed) => match HeaderValue::from_str(&renewed.access_token) {
                Ok(value) => {
                    response.headers_mut().insert(ACCESS_TOKEN_HEADER, value);
                }
                Err(e) => tracing::error!("Renewed access token is not a valid header: {}", e),
            },
            Err(e) => {
                tracing::debug!(user_id = %claims.base.sub, "Access token not renewed: {}", e);
            }
        }
    }

    Ok(response)
}

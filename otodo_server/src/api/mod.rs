//! HTTP API for the otodo session service.
//!
//! # Modules
//!
//! - [`session`]: ping, login, logout and access-token refresh
//! - [`users`]: registration and the current user
//! - [`oauth`]: GitHub delegated login
//! - [`middleware`]: bearer-token authentication for protected endpoints
//! - [`request_id`]: request correlation ids
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                     - Liveness and store check (public)
//! POST   /api/users                  - Register (public)
//! GET    /api/session                - Ping (public)
//! POST   /api/session                - Login (public)
//! DELETE /api/session                - Logout (auth required)
//! POST   /api/session/token          - Refresh access token (public)
//! GET    /api/session/oauth/github   - GitHub authorization URL (public)
//! POST   /api/session/oauth/github   - GitHub callback (public)
//! GET    /api/user                   - Current user (auth required)
//! ```
//!
//! Responses to authenticated requests carry a renewed access token in the
//! `x-access-token` header once the presented token is close to expiry.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use otodo::{SessionConfig, SessionManager, db::MemoryStore};
//! use otodo_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::with_seed_data());
//! let state = AppState {
//!     sessions: Arc::new(SessionManager::new(store, &SessionConfig::new("jwt_secret"))),
//!     oauth: None,
//!     database: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod middleware;
pub mod oauth;
pub mod request_id;
pub mod session;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use otodo::{AuthError, OAuthBridge, SessionManager, db::Database};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    /// `None` when GitHub login is not configured
    pub oauth: Option<Arc<OAuthBridge>>,
    /// `None` for the in-memory store
    pub database: Option<Database>,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// JSON body extractor whose rejections use the [`ErrorResponse`] shape
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err((
                rejection.status(),
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            )),
        }
    }
}

/// Map an authentication error to its HTTP status and client-safe body
///
/// Storage failures are logged here so handlers only see the sanitized message.
pub fn error_response(err: AuthError) -> ApiError {
    let status = match &err {
        e if e.is_unauthorized() => StatusCode::UNAUTHORIZED,
        AuthError::InvalidOAuthState
        | AuthError::InvalidUsername(_)
        | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
        AuthError::UsernameTaken | AuthError::AccountAlreadyLinked => StatusCode::CONFLICT,
        AuthError::ExchangeError(_) | AuthError::ProfileFetchError(_) => StatusCode::BAD_GATEWAY,
        AuthError::OAuthDisabled => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(status = %status, "Request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/users", post(users::register))
        .route("/api/session", get(session::ping).post(session::login))
        .route("/api/session/token", post(session::refresh))
        .route(
            "/api/session/oauth/github",
            get(oauth::authorize).post(oauth::callback),
        );

    let protected_routes = Router::new()
        .route("/api/session", delete(session::logout))
        .route("/api/user", get(users::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the credential store answers, `503 Service
/// Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match &state.database {
        Some(database) => database.health_check().await.is_ok(),
        None => true,
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": if state.database.is_some() { "postgres" } else { "memory" },
        "oauth": state.oauth.is_some(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use otodo::db::timeouts::TimeoutError;
    use std::time::Duration;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(AuthError::InvalidCredential).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(error_response(AuthError::Revoked).0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            error_response(AuthError::InvalidOAuthState).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(AuthError::UsernameTaken).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(AuthError::AccountAlreadyLinked).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(AuthError::ExchangeError("timeout".to_string())).0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_response(AuthError::OAuthDisabled).0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_oauth_misconfiguration_is_server_error() {
        let (status, Json(body)) = error_response(AuthError::OAuthMisconfigured(
            "Invalid authorize URL: relative URL without a base".to_string(),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }

    #[test]
    fn test_storage_errors_are_sanitized() {
        let (status, Json(body)) = error_response(AuthError::Storage(TimeoutError::Timeout(
            Duration::from_secs(5),
        )));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }
}

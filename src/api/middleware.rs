//! API middleware layers.
//!
//! Provides the session check placed in front of every data route.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::envelope::ApiErrorResponse;
use super::AppState;
use crate::auth::{extract_bearer, AuthError};
use crate::services::ServiceError;

/// Require a valid bearer access token when authentication is configured.
///
/// The token is verified against the auth service and the resulting
/// [`AuthUser`](crate::auth::AuthUser) is stored in the request extensions.
/// With no auth client the request passes through untouched.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(auth) = state.auth.as_ref() else {
        return next.run(request).await;
    };

    let Some(token) = extract_bearer(request.headers()) else {
        return ApiErrorResponse::unauthorized("sign in required");
    };

    match auth.get_user(&token).await {
        Ok(user) => {
            debug!(user = %user.id, path = %request.uri().path(), "Session verified");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(AuthError::Rejected(_)) => ApiErrorResponse::unauthorized("session expired or invalid"),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

//! Sign-in, sign-up and sign-out passthrough to the auth service

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use super::AppState;
use crate::api::envelope::{ApiErrorResponse, ApiJson, ApiResponse};
use crate::auth::{extract_bearer, AuthClient, AuthError, Credentials, Session};
use crate::services::ServiceError;

fn client(state: &AppState) -> Result<&Arc<AuthClient>, Response> {
    state
        .auth
        .as_ref()
        .ok_or_else(|| ApiErrorResponse::service_unavailable("authentication is not configured"))
}

fn check_credentials(creds: &Credentials) -> Result<(), Response> {
    if creds.email.trim().is_empty() || creds.password.is_empty() {
        return Err(ApiErrorResponse::bad_request("email and password are required"));
    }
    Ok(())
}

/// POST /api/v1/auth/login
pub async fn login(State(state): State<AppState>, ApiJson(creds): ApiJson<Credentials>) -> Response {
    let auth = match client(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_credentials(&creds) {
        return resp;
    }
    match auth.sign_in_with_password(creds.email.trim(), &creds.password).await {
        Ok(session) => ApiResponse::ok(session),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// Present when the account is usable immediately
    pub session: Option<Session>,
    pub confirmation_required: bool,
}

/// POST /api/v1/auth/signup
pub async fn signup(State(state): State<AppState>, ApiJson(creds): ApiJson<Credentials>) -> Response {
    let auth = match client(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_credentials(&creds) {
        return resp;
    }
    match auth.sign_up(creds.email.trim(), &creds.password).await {
        Ok(session) => ApiResponse::created(SignupResponse {
            confirmation_required: session.is_none(),
            session,
        }),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = match client(&state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(token) = extract_bearer(&headers) else {
        return ServiceError::from(AuthError::MissingToken).into_response();
    };
    match auth.sign_out(&token).await {
        Ok(()) => ApiResponse::ok(json!({ "signed_out": true })),
        Err(e) => ServiceError::from(e).into_response(),
    }
}

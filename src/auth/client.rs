//! HTTP client for the hosted auth service.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{AuthError, AuthUser, Session};

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn with_key(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
    }

    /// Email + password sign-in.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let req = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let resp = check(self.with_key(req).send().await?).await?;
        let session: Session = resp.json().await?;
        info!(email, "User signed in");
        Ok(session)
    }

    /// Register a new account. The auth service may require email
    /// confirmation, in which case no session is returned.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let req = self
            .http
            .post(self.endpoint("signup"))
            .json(&json!({ "email": email, "password": password }));
        let resp = check(self.with_key(req).send().await?).await?;
        let body: Value = resp.json().await?;
        info!(email, "User signed up");
        if body.get("access_token").is_some() {
            Ok(Some(serde_json::from_value(body).map_err(|e| AuthError::Service {
                status: 200,
                message: e.to_string(),
            })?))
        } else {
            Ok(None)
        }
    }

    /// Resolve an access token to its user.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let req = self
            .http
            .get(self.endpoint("user"))
            .bearer_auth(access_token);
        let resp = check(self.with_key(req).send().await?).await?;
        let user: AuthUser = resp.json().await?;
        debug!(user = %user.id, "Token verified");
        Ok(user)
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let req = self
            .http
            .post(self.endpoint("logout"))
            .bearer_auth(access_token);
        check(self.with_key(req).send().await?).await?;
        info!("User signed out");
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response, AuthError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or(body);
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        | StatusCode::UNPROCESSABLE_ENTITY => Err(AuthError::Rejected(message)),
        _ => Err(AuthError::Service {
            status: status.as_u16(),
            message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let client = AuthClient::new("https://example.test/", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint("token"), "https://example.test/auth/v1/token");
        let req = client
            .with_key(client.http.get(client.endpoint("user")).bearer_auth("jwt"))
            .build()
            .unwrap();
        assert_eq!(req.headers()["apikey"], "anon");
        assert_eq!(req.headers()["authorization"], "Bearer jwt");
    }
}

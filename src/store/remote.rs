//! Hosted row API client
//!
//! Talks to a PostgREST endpoint at `<url>/rest/v1/<table>`. Filters and
//! ordering travel as query parameters, mutations ask for the affected rows
//! back with `Prefer: return=representation`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ensure_filtered, Filter, Query, StoreError, Table, TableStore};

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
    /// Non-default schema, sent as `Accept-Profile` / `Content-Profile`.
    pub schema: Option<String>,
    pub timeout: Duration,
}

/// PostgREST-backed [`TableStore`].
#[derive(Clone)]
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    schema: Option<String>,
}

impl RemoteStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            schema: config.schema.clone(),
        })
    }

    /// Endpoint URL for a table.
    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn authorized(&self, req: RequestBuilder, writes: bool) -> RequestBuilder {
        let mut req = req
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key));
        if let Some(schema) = &self.schema {
            req = req.header("Accept-Profile", schema);
            if writes {
                req = req.header("Content-Profile", schema);
            }
        }
        if writes {
            req = req.header("Prefer", "return=representation");
        }
        req
    }

    async fn rows(table: Table, resp: Response) -> Result<Vec<Value>, StoreError> {
        let resp = Self::check(table, resp).await?;
        let body = resp.bytes().await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_slice(&body)? {
            Value::Array(rows) => Ok(rows),
            obj @ Value::Object(_) => Ok(vec![obj]),
            _ => Err(StoreError::InvalidRow {
                table,
                reason: "backend response is not a row list".to_string(),
            }),
        }
    }

    async fn check(table: Table, resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = backend_message(&body);
        warn!(table = %table, status = status.as_u16(), %message, "Backend request failed");
        if status == StatusCode::CONFLICT {
            Err(StoreError::Conflict(message))
        } else {
            Err(StoreError::Backend {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Extract the `message` field of a PostgREST error body, or the raw text.
fn backend_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_param).collect()
}

#[async_trait]
impl TableStore for RemoteStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, StoreError> {
        debug!(table = %table, "select");
        let req = self
            .http
            .get(self.table_url(table))
            .query(&query.to_params());
        let resp = self.authorized(req, false).send().await?;
        Self::rows(table, resp).await
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        debug!(table = %table, rows = rows.len(), "insert");
        let req = self.http.post(self.table_url(table)).json(&rows);
        let resp = self.authorized(req, true).send().await?;
        Self::rows(table, resp).await
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        ensure_filtered("update", table, filters)?;
        debug!(table = %table, "update");
        let req = self
            .http
            .patch(self.table_url(table))
            .query(&filter_params(filters))
            .json(&patch);
        let resp = self.authorized(req, true).send().await?;
        Self::rows(table, resp).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<usize, StoreError> {
        ensure_filtered("delete", table, filters)?;
        debug!(table = %table, "delete");
        let req = self
            .http
            .delete(self.table_url(table))
            .query(&filter_params(filters));
        let resp = self.authorized(req, true).send().await?;
        Ok(Self::rows(table, resp).await?.len())
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

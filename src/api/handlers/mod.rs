//! API route handlers
//!
//! Thin adapters from HTTP to [`crate::services`], one module per page:
//! - Health and auth passthrough
//! - Machine profile and dashboard KPIs
//! - Parts and inventory, work orders, preventive schedules and calendar
//! - Sensor readings, vendors and purchase orders, alerts

pub mod alerts;
pub mod auth;
pub mod health;
pub mod machine;
pub mod maintenance;
pub mod parts;
pub mod predictive;
pub mod preventive;
pub mod procurement;

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::envelope::ApiResponse;
use crate::auth::AuthClient;
use crate::services::ServiceResult;
use crate::store::TableStore;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Row storage for every table
    pub store: Arc<dyn TableStore>,
    /// Auth service client; `None` disables the session check
    pub auth: Option<Arc<AuthClient>>,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, auth: Option<Arc<AuthClient>>) -> Self {
        Self { store, auth }
    }

    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// `?search=` on list pages.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// Wrap a service result in the 200 envelope.
pub(crate) fn respond<T: Serialize>(result: ServiceResult<T>) -> Response {
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => e.into_response(),
    }
}

/// Wrap a service result in the 201 envelope.
pub(crate) fn respond_created<T: Serialize>(result: ServiceResult<T>) -> Response {
    match result {
        Ok(data) => ApiResponse::created(data),
        Err(e) => e.into_response(),
    }
}

/// Today's date in UTC.
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

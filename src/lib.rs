//! Roastery CMMS: maintenance management for a single coffee roaster
//!
//! Tracks one machine's work orders, spare parts, preventive schedules,
//! manually entered sensor readings, vendors and purchase orders, and
//! derives reliability KPIs from the maintenance history.
//!
//! ## Architecture
//!
//! - **Store**: row storage behind the [`store::TableStore`] trait, either an
//!   embedded sled database or a hosted PostgREST-style backend
//! - **Services**: form validation, derived values and cross-table side
//!   effects (stock draw-down, alerts, delivery receipts)
//! - **API**: axum JSON endpoints over the services
//! - **Auth**: optional email/password sessions via a hosted auth service

pub mod api;
pub mod auth;
pub mod config;
pub mod services;
pub mod store;
pub mod types;

// Re-export configuration
pub use config::CmmsConfig;

// Re-export storage
pub use store::{LocalStore, RemoteConfig, RemoteStore, StoreError, Table, TableStore};

// Re-export the API entry points
pub use api::{create_app, AppState};

// Re-export service errors
pub use services::{ServiceError, ServiceResult};

//! Page-level operations
//!
//! Each submodule validates a submitted form, issues the row calls against a
//! [`TableStore`](crate::store::TableStore) and returns the refreshed rows,
//! computing the few derived values (KPIs, stock and reading status, due
//! state, pending totals) in-process.

pub mod alerts;
pub mod calendar;
pub mod dashboard;
pub mod machine;
pub mod maintenance;
pub mod parts;
pub mod predictive;
pub mod preventive;
pub mod purchases;
pub mod vendors;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("no machine registered")]
    MachineMissing,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServiceError {
    /// Build a validation error from a list of problems.
    pub fn invalid(problems: Vec<String>) -> Self {
        Self::Validation(problems.join("; "))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Collects form problems so every one is reported at once.
#[derive(Debug, Default)]
pub(crate) struct Problems(Vec<String>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.push(format!("{field} is required"));
        }
    }

    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.0.push(message.into());
        }
    }

    pub fn finish(self) -> ServiceResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::invalid(self.0))
        }
    }
}

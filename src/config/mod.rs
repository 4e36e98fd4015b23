//! Service Configuration Module
//!
//! Provides the deployment configuration loaded from TOML: which backend to
//! talk to, HTTP server settings, and the tunables behind the derived
//! statistics (KPI period, reading warning band, due-soon window).
//!
//! ## Loading Order
//!
//! 1. `CMMS_CONFIG` environment variable (path to TOML file)
//! 2. `cmms.toml` in the current working directory
//! 3. Built-in defaults
//!
//! `CMMS_SERVER_ADDR`, `CMMS_BACKEND_URL`, `CMMS_BACKEND_KEY` and
//! `CMMS_DATA_DIR` override the file afterwards.
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(CmmsConfig::load());
//!
//! // Anywhere in the codebase:
//! let period = config::get().kpi.period_hours;
//! ```

mod cmms_config;
pub mod defaults;
pub mod validation;

pub use cmms_config::*;

use std::sync::OnceLock;

/// Global configuration, initialized once at startup.
static CMMS_CONFIG: OnceLock<CmmsConfig> = OnceLock::new();

static DEFAULT_CONFIG: OnceLock<CmmsConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: CmmsConfig) {
    if CMMS_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once - ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Falls back to built-in defaults when `init()` has not been called, which
/// is the case in unit tests.
pub fn get() -> &'static CmmsConfig {
    CMMS_CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT_CONFIG.get_or_init(CmmsConfig::default))
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    CMMS_CONFIG.get().is_some()
}

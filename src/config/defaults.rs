//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Request body limit (bytes). Work order forms are small; 1 MiB is ample.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// Backend
// ============================================================================

/// HTTP client timeout for the hosted row API and auth service (seconds).
pub const BACKEND_HTTP_TIMEOUT_SECS: u64 = 30;

/// Directory of the embedded local table store.
pub const LOCAL_DATA_DIR: &str = "./data/cmms";

// ============================================================================
// KPIs
// ============================================================================

/// Observation period for MTBF and availability (hours). 8 760 = one year.
pub const KPI_PERIOD_HOURS: f64 = 8_760.0;

// ============================================================================
// Predictive
// ============================================================================

/// Fraction inside a threshold at which a reading is shown as a warning.
pub const READING_WARNING_BAND: f64 = 0.10;

/// Number of readings on the predictive overview.
pub const RECENT_READINGS_LIMIT: usize = 10;

// ============================================================================
// Preventive
// ============================================================================

/// A schedule due within this many days is flagged "due soon".
pub const DUE_SOON_DAYS: i64 = 7;

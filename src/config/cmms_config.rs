//! Service configuration - backend selection, server and tunables
//!
//! Each section implements `Default`, so an empty or missing file yields a
//! working development setup (embedded local backend, auth off).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use super::validation::{validate_unknown_keys, ValidationWarning};

const REDACTED: &str = "********";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `CmmsConfig::load()` which searches:
/// 1. `$CMMS_CONFIG` env var
/// 2. `./cmms.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CmmsConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Where rows are stored
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub kpi: KpiConfig,

    #[serde(default)]
    pub predictive: PredictiveConfig,

    #[serde(default)]
    pub preventive: PreventiveConfig,

    /// Automatic alert generation
    #[serde(default)]
    pub alerts: AlertsConfig,
}

impl CmmsConfig {
    /// Load configuration using the standard search order, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file_or_default();
        config.apply_env_overrides();
        config
    }

    fn load_file_or_default() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("CMMS_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from CMMS_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from CMMS_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "CMMS_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./cmms.toml
        let local = PathBuf::from("cmms.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./cmms.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./cmms.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No cmms.toml found - using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let (config, warnings) = Self::load_from_file_with_warnings(path)?;
        for w in &warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Load from a file and hand back the unknown-key warnings instead of
    /// logging them (used by `check-config`).
    pub fn load_from_file_with_warnings(
        path: &Path,
    ) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let (config, warnings) = Self::parse(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok((config, warnings))
    }

    /// Two-pass parse: unknown-key warnings first, then serde.
    pub fn parse(contents: &str) -> Result<(Self, Vec<ValidationWarning>), toml::de::Error> {
        let warnings = validate_unknown_keys(contents);
        let config: Self = toml::from_str(contents)?;
        Ok((config, warnings))
    }

    /// Apply `CMMS_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(addr) = lookup("CMMS_SERVER_ADDR") {
            self.server.addr = addr;
        }
        if let Some(url) = lookup("CMMS_BACKEND_URL") {
            self.backend.url = Some(url);
            // A backend URL in the environment implies the hosted backend.
            self.backend.kind = BackendKind::Remote;
        }
        if let Some(key) = lookup("CMMS_BACKEND_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(dir) = lookup("CMMS_DATA_DIR") {
            self.backend.data_dir = PathBuf::from(dir);
        }
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Like [`Self::to_toml`], with `backend.api_key` masked for display.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.backend.api_key.is_some() {
            shown.backend.api_key = Some(REDACTED.to_string());
        }
        shown.to_toml()
    }

    /// Validate ranges and cross-section consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be > 0".to_string());
        }

        if self.backend.kind == BackendKind::Remote {
            if self.backend.url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                errors.push("backend.url is required when backend.kind = \"remote\"".to_string());
            } else if let Some(url) = &self.backend.url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    errors.push(format!("backend.url must be an http(s) URL (got '{url}')"));
                }
            }
            if self.backend.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                errors.push("backend.api_key is required when backend.kind = \"remote\"".to_string());
            }
        }
        if self.backend.timeout_secs == 0 {
            errors.push("backend.timeout_secs must be > 0".to_string());
        }
        if self.auth.enabled && self.backend.kind != BackendKind::Remote {
            errors.push("auth.enabled requires backend.kind = \"remote\"".to_string());
        }

        if !self.kpi.period_hours.is_finite() || self.kpi.period_hours <= 0.0 {
            errors.push(format!(
                "kpi.period_hours must be a positive number (got {})",
                self.kpi.period_hours
            ));
        }

        let band = self.predictive.warning_band;
        if !band.is_finite() || !(0.0..1.0).contains(&band) {
            errors.push(format!("predictive.warning_band must be in [0, 1) (got {band})"));
        }
        if self.predictive.recent_limit == 0 {
            errors.push("predictive.recent_limit must be > 0".to_string());
        }

        if self.preventive.due_soon_days < 0 {
            errors.push(format!(
                "preventive.due_soon_days cannot be negative (got {})",
                self.preventive.due_soon_days
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `CMMS_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Allowed CORS origins. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

fn default_max_body_bytes() -> usize {
    defaults::MAX_BODY_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============================================================================
// Backend
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded sled store under `data_dir`
    #[default]
    Local,
    /// Hosted row API and auth service
    Remote,
    /// Throwaway in-memory store
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Project URL of the hosted backend, e.g. `https://xyz.example.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Anon/service key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// Non-default database schema
    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    defaults::BACKEND_HTTP_TIMEOUT_SECS
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(defaults::LOCAL_DATA_DIR)
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: None,
            api_key: None,
            schema: None,
            timeout_secs: default_timeout_secs(),
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Require a signed-in user on every data route
    #[serde(default)]
    pub enabled: bool,
}

// ============================================================================
// Derived statistics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    /// Observation period for MTBF and availability (hours)
    #[serde(default = "default_period_hours")]
    pub period_hours: f64,
}

fn default_period_hours() -> f64 {
    defaults::KPI_PERIOD_HOURS
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            period_hours: default_period_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveConfig {
    #[serde(default = "default_warning_band")]
    pub warning_band: f64,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_warning_band() -> f64 {
    defaults::READING_WARNING_BAND
}

fn default_recent_limit() -> usize {
    defaults::RECENT_READINGS_LIMIT
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            warning_band: default_warning_band(),
            recent_limit: default_recent_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventiveConfig {
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
}

fn default_due_soon_days() -> i64 {
    defaults::DUE_SOON_DAYS
}

impl Default for PreventiveConfig {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Raise a critical alert when a reading is outside its thresholds
    #[serde(default = "default_true")]
    pub sensor_alarms: bool,

    /// Raise a warning when consumption drops stock to its reorder point
    #[serde(default = "default_true")]
    pub low_stock: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            sensor_alarms: true,
            low_stock: true,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_validates() {
        let config = CmmsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.kind, BackendKind::Local);
        assert!((config.kpi.period_hours - 8760.0).abs() < f64::EPSILON);
        assert_eq!(config.predictive.recent_limit, 10);
        assert_eq!(config.preventive.due_soon_days, 7);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let (config, warnings) = CmmsConfig::parse(
            r#"
            [backend]
            kind = "remote"
            url = "https://abc.example.co"
            api_key = "anon"

            [kpi]
            period_hours = 720.0
            "#,
        )
        .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.backend.kind, BackendKind::Remote);
        assert!((config.kpi.period_hours - 720.0).abs() < f64::EPSILON);
        assert!((config.predictive.warning_band - 0.10).abs() < f64::EPSILON);
        assert!(config.alerts.low_stock);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_without_url_fails_validation() {
        let mut config = CmmsConfig::default();
        config.backend.kind = BackendKind::Remote;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("backend.url")));
                assert!(errors.iter().any(|e| e.contains("backend.api_key")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_range_checks() {
        let mut config = CmmsConfig::default();
        config.kpi.period_hours = 0.0;
        config.predictive.warning_band = 1.5;
        config.auth.enabled = true;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CMMS_SERVER_ADDR", "127.0.0.1:9000"),
            ("CMMS_BACKEND_URL", "https://abc.example.co"),
            ("CMMS_BACKEND_KEY", "secret"),
            ("CMMS_DATA_DIR", "  "),
        ]
        .into_iter()
        .collect();
        let mut config = CmmsConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.backend.kind, BackendKind::Remote);
        assert_eq!(config.backend.api_key.as_deref(), Some("secret"));
        // Blank values are ignored.
        assert_eq!(config.backend.data_dir, PathBuf::from(defaults::LOCAL_DATA_DIR));
    }

    #[test]
    fn test_load_from_file_reports_typos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmms.toml");
        std::fs::write(&path, "[preventive]\ndue_son_days = 3\n").unwrap();
        let (config, warnings) = CmmsConfig::load_from_file_with_warnings(&path).unwrap();
        assert_eq!(config.preventive.due_soon_days, 7);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].suggestion.as_deref(), Some("preventive.due_soon_days"));
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let toml = CmmsConfig::default().to_toml().unwrap();
        let (parsed, warnings) = CmmsConfig::parse(&toml).unwrap();
        assert!(warnings.is_empty(), "defaults must only use known keys: {warnings:?}");
        assert_eq!(parsed.server.addr, defaults::SERVER_ADDR);
    }

    #[test]
    fn test_redacted_toml_masks_api_key() {
        let mut config = CmmsConfig::default();
        config.backend.api_key = Some("service-role-secret".into());
        let shown = config.to_redacted_toml().unwrap();
        assert!(!shown.contains("service-role-secret"));
        assert!(shown.contains(REDACTED));
        assert_eq!(config.backend.api_key.as_deref(), Some("service-role-secret"));

        let without_key = CmmsConfig::default().to_redacted_toml().unwrap();
        assert!(!without_key.contains(REDACTED));
    }
}

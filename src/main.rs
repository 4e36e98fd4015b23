//! roaster-cmms - maintenance management for a single coffee roaster
//!
//! Serves the JSON API behind the maintenance pages and a couple of
//! operator commands.
//!
//! # Usage
//!
//! ```bash
//! # Serve with the embedded local store under ./data/cmms
//! cargo run --release
//!
//! # Serve against the hosted backend
//! CMMS_BACKEND_URL=https://project.example.co CMMS_BACKEND_KEY=... ./roaster-cmms serve
//!
//! # Print dashboard KPIs as JSON
//! ./roaster-cmms kpis
//!
//! # Validate a config file
//! ./roaster-cmms --config cmms.toml check-config
//! ```
//!
//! # Environment Variables
//!
//! - `CMMS_CONFIG`: Path to the TOML config (default: ./cmms.toml)
//! - `CMMS_SERVER_ADDR`, `CMMS_BACKEND_URL`, `CMMS_BACKEND_KEY`, `CMMS_DATA_DIR`: overrides
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe the local store on startup (for testing)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use roaster_cmms::auth::AuthClient;
use roaster_cmms::config::{self, BackendKind, CmmsConfig};
use roaster_cmms::services::dashboard;
use roaster_cmms::store::{LocalStore, RemoteConfig, RemoteStore, TableStore};
use roaster_cmms::{create_app, AppState};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "roaster-cmms")]
#[command(about = "Maintenance management for a single coffee roaster")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long, global = true)]
    addr: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long, env = "CMMS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, global = true)]
    backend: Option<BackendKind>,

    /// Directory of the local store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Wipe every table of the local store on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long, global = true)]
    reset_db: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum SubCommand {
    /// Run the HTTP API (default)
    Serve,
    /// Print the dashboard KPIs as JSON
    Kpis,
    /// Load and validate the configuration, printing any warnings
    CheckConfig,
}

// ============================================================================
// Configuration
// ============================================================================

/// Load the config file (explicit path or the standard search), then apply
/// environment and CLI overrides.
fn load_config(args: &CliArgs) -> Result<CmmsConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let mut cfg = CmmsConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            cfg.apply_env_overrides();
            cfg
        }
        None => CmmsConfig::load(),
    };
    apply_cli_overrides(&mut cfg, args);
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut CmmsConfig, args: &CliArgs) {
    if let Some(addr) = &args.addr {
        cfg.server.addr = addr.clone();
    }
    if let Some(kind) = args.backend {
        cfg.backend.kind = kind;
    }
    if let Some(dir) = &args.data_dir {
        cfg.backend.data_dir = dir.clone();
    }
}

// ============================================================================
// Database Reset
// ============================================================================

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

// ============================================================================
// Backend Construction
// ============================================================================

fn build_store(cfg: &CmmsConfig, reset: bool) -> Result<Arc<dyn TableStore>> {
    let backend = &cfg.backend;
    match backend.kind {
        BackendKind::Local => {
            let store = LocalStore::open(&backend.data_dir).with_context(|| {
                format!("Failed to open local store at {}", backend.data_dir.display())
            })?;
            if reset {
                warn!(path = %backend.data_dir.display(), "RESET_DB detected - wiping all tables");
                store.clear().context("Failed to clear local store")?;
            }
            Ok(Arc::new(store))
        }
        BackendKind::Memory => {
            info!("Using a temporary in-memory store; data is lost on exit");
            Ok(Arc::new(LocalStore::temporary().context("Failed to create temporary store")?))
        }
        BackendKind::Remote => {
            if reset {
                warn!("RESET_DB ignored for the remote backend");
            }
            let remote = RemoteConfig {
                url: backend.url.clone().context("backend.url is required for the remote backend")?,
                api_key: backend
                    .api_key
                    .clone()
                    .context("backend.api_key is required for the remote backend")?,
                schema: backend.schema.clone(),
                timeout: backend.timeout(),
            };
            info!(url = %remote.url, "Using the hosted backend");
            Ok(Arc::new(RemoteStore::new(&remote).context("Failed to build backend client")?))
        }
    }
}

fn build_auth(cfg: &CmmsConfig) -> Result<Option<Arc<AuthClient>>> {
    if !cfg.auth.enabled {
        return Ok(None);
    }
    let (Some(url), Some(key)) = (&cfg.backend.url, &cfg.backend.api_key) else {
        anyhow::bail!("auth.enabled requires backend.url and backend.api_key");
    };
    let client = AuthClient::new(url, key, cfg.backend.timeout())
        .context("Failed to build auth client")?;
    info!("Authentication enabled - data routes require a session");
    Ok(Some(Arc::new(client)))
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpServer => write!(f, "HttpServer"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring");

    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => {
                info!("Supervisor: task {} completed normally", task_name);
            }
            Ok(Err(e)) => {
                error!("Supervisor: task failed with error: {}", e);
                cancel_token.cancel();
                return Err(e);
            }
            Err(e) => {
                error!("Supervisor: task panicked: {}", e);
                cancel_token.cancel();
                return Err(anyhow::anyhow!("Task panicked: {}", e));
            }
        }
    }

    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn run_serve(cfg: &CmmsConfig, store: Arc<dyn TableStore>) -> Result<()> {
    let auth = build_auth(cfg)?;
    let app = create_app(AppState::new(store, auth));

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.addr))?;
    info!(addr = %cfg.server.addr, backend = %cfg.backend.kind, "HTTP server listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let mut task_set = JoinSet::new();
    spawn_http_server(&mut task_set, listener, app, cancel_token.clone());
    run_supervisor(&mut task_set, cancel_token).await
}

async fn run_kpis(cfg: &CmmsConfig, store: Arc<dyn TableStore>) -> Result<()> {
    let kpis = dashboard::load_dashboard(store.as_ref(), cfg.kpi.period_hours)
        .await
        .context("Failed to compute KPIs")?;
    println!("{}", serde_json::to_string_pretty(&kpis)?);
    Ok(())
}

fn run_check_config(args: &CliArgs) -> Result<()> {
    let path = args
        .config
        .clone()
        .or_else(|| Some(PathBuf::from("cmms.toml")).filter(|p| p.exists()));

    let mut cfg = match &path {
        Some(path) => {
            let (cfg, warnings) = CmmsConfig::load_from_file_with_warnings(path)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            println!("Config: {}", path.display());
            for w in &warnings {
                println!("  warning: {w}");
            }
            if warnings.is_empty() {
                println!("  no unknown keys");
            }
            cfg
        }
        None => {
            println!("No config file found - using built-in defaults");
            CmmsConfig::default()
        }
    };
    cfg.apply_env_overrides();
    apply_cli_overrides(&mut cfg, args);
    cfg.validate().context("Effective configuration is invalid")?;

    println!();
    println!("Effective configuration:");
    println!("{}", cfg.to_redacted_toml()?);
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let command = args.command.unwrap_or(SubCommand::Serve);
    if command == SubCommand::CheckConfig {
        return run_check_config(&args);
    }

    let cfg = load_config(&args)?;
    cfg.validate().context("Invalid configuration")?;
    config::init(cfg.clone());

    info!("Roaster CMMS v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&cfg, should_reset_db(args.reset_db))?;
    info!(backend = store.backend_name(), "Table store ready");

    match command {
        SubCommand::Serve => run_serve(&cfg, store).await?,
        SubCommand::Kpis => run_kpis(&cfg, store).await?,
        SubCommand::CheckConfig => {}
    }

    info!("Shutdown complete");
    Ok(())
}

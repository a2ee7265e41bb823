//! # Duka Terminal Library
//!
//! Everything behind the `duka-terminal` binary: state restore, the command
//! layer, the stock-alert timer and the interactive shell.
//!
//! ## Module Organization
//! ```text
//! duka_terminal_lib/
//! ├── lib.rs          ◄─── You are here (startup & shutdown)
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState and restore rules
//! │   ├── db.rs       ◄─── Snapshot persistence
//! │   ├── catalog.rs  ◄─── Shared catalog handle
//! │   ├── ledger.rs   ◄─── Shared ledger handle
//! │   ├── cart.rs     ◄─── Shared cart handle + CartView
//! │   ├── config.rs   ◄─── Settings and env overrides
//! │   └── events.rs   ◄─── StoreEvent broadcast
//! ├── commands/       ◄─── product, cart, sale, analytics, config
//! ├── alerts.rs       ◄─── Periodic stock-alert monitor
//! ├── shell/          ◄─── Line parser, renderer, run loop
//! └── error.rs        ◄─── ApiError for every command
//! ```

pub mod alerts;
pub mod commands;
pub mod error;
pub mod shell;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use alerts::AlertMonitor;
use duka_db::{Database, DbConfig};
use shell::Shell;
use state::AppState;

/// Runs the terminal application until the shell exits.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. tracing-subscriber with EnvFilter (RUST_LOG)                        │
/// │  2. Database path: DUKA_DB_PATH or the platform data directory          │
/// │  3. Connect SQLite (WAL) and run migrations                             │
/// │  4. AppState::load: settings, products (seeded on first run), sales,    │
/// │     cart                                                                │
/// │  5. Spawn the stock-alert monitor                                       │
/// │  6. Shell over stdin/stdout until quit or EOF                           │
/// │  7. Stop the monitor, close the pool                                    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Duka POS terminal");

    let db_path = get_database_path()?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    info!("Database connected and migrations applied");

    let state = AppState::load(db.clone()).await;

    let (monitor, monitor_handle) = AlertMonitor::new(&state);
    let monitor_task = tokio::spawn(monitor.run());

    let shell = Shell::new(state);
    let result = shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await;

    if let Err(e) = monitor_handle.shutdown().await {
        warn!(error = %e, "Alert monitor did not acknowledge shutdown");
    }
    if let Err(e) = monitor_task.await {
        warn!(error = %e, "Alert monitor task failed");
    }
    db.close().await;

    info!("Duka POS terminal stopped");
    result.map_err(Into::into)
}

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so they never interleave with shell output on stdout.
/// Default filter: `info,duka=debug,sqlx=warn`; override with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,duka=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Database file location.
///
/// - **Linux**: `~/.local/share/duka-pos/duka.db`
/// - **macOS**: `~/Library/Application Support/com.duka.pos/duka.db`
/// - **Windows**: `%APPDATA%\duka\pos\data\duka.db`
///
/// `DUKA_DB_PATH` overrides all of these.
fn get_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(path) = std::env::var("DUKA_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs =
        ProjectDirs::from("com", "duka", "pos").ok_or("Could not determine app data directory")?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("duka.db"))
}

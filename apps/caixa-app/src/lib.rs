//! # Caixa App Library
//!
//! Application layer for Caixa POS: configuration, logging, state and the
//! command surface. Business rules live in `caixa-core` and `caixa-db`.
//!
//! ## Module Organization
//! ```text
//! caixa_app/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── config.rs       ◄─── AppConfig: defaults → TOML → env
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database + sale engine settings
//! │   └── config.rs   ◄─── Store info for receipts
//! ├── commands/
//! │   ├── mod.rs      ◄─── Dispatch
//! │   ├── product.rs  ◄─── Catalogue commands
//! │   ├── stock.rs    ◄─── Ledger commands
//! │   └── sale.rs     ◄─── Checkout and reporting commands
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use caixa_db::{Database, DbError};
use config::{AppConfig, ConfigError};
use state::{ConfigState, DbState};

/// Startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database initialization failed: {0}")]
    Database(#[from] DbError),
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - wins over everything
/// - `RUST_LOG=caixa_db=trace` - trace for one crate only
/// - Otherwise `filter` (from `[logging]` / `CAIXA_LOG`)
///
/// Logs go to stderr; stdout carries command replies.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // A second call (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Connects the database and builds the state objects.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Resolve database path (config, env, platform data dir)             │
/// │  2. Connect (WAL, busy timeout) and run pending migrations             │
/// │  3. DbState: Database + commit budget + reference offset               │
/// │  4. ConfigState: store info                                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn bootstrap(config: &AppConfig) -> Result<(DbState, ConfigState), StartupError> {
    let db_config = config.db_config()?;
    let offset = config.reference_offset()?;

    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let db_state = DbState::new(db, config.commit_budget(), offset);
    let config_state = ConfigState::from_config(config);

    info!(
        commit_budget_secs = config.sales.commit_timeout_secs,
        utc_offset_minutes = config.sales.utc_offset_minutes,
        store = %config.store.name,
        "State initialized"
    );
    Ok((db_state, config_state))
}

//! # Application Configuration
//!
//! Settings for the database, the sale engine, the establishment and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAIXA_DB_PATH=/srv/caixa/caixa.db                                  │
//! │     CAIXA_COMMIT_TIMEOUT_SECS=10                                       │
//! │     CAIXA_UTC_OFFSET_MINUTES=-180                                      │
//! │     CAIXA_STORE_NAME="Mercado Central"                                 │
//! │     CAIXA_LOG=debug                                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     explicit path, else $CAIXA_CONFIG, else                            │
//! │     ~/.config/caixa-pos/caixa.toml (Linux)                             │
//! │     ~/Library/Application Support/com.caixa.pos/caixa.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/caixa/caixa.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [sales]
//! commit_timeout_secs = 10
//! utc_offset_minutes = -180   # day bounds for sale listings
//!
//! [store]
//! name = "Mercado Central"
//! tax_id = "12.345.678/0001-90"
//! address = "Rua das Flores, 100"
//! city = "Curitiba"
//!
//! [logging]
//! filter = "info,caixa=debug,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use caixa_core::SALE_COMMIT_TIMEOUT_SECS;
use caixa_db::DbConfig;
use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Largest UTC offset accepted, in minutes (±14h).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Default tracing filter when neither `RUST_LOG` nor `CAIXA_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,caixa=debug,sqlx=warn";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine app data directory")]
    NoDataDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the SQLite lock before giving up.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

/// `[sales]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSettings {
    /// Budget for one sale commit.
    #[serde(default = "default_commit_timeout")]
    pub commit_timeout_secs: u64,

    /// Reference offset for "today" and for filter dates, in minutes east of UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_commit_timeout() -> u64 {
    SALE_COMMIT_TIMEOUT_SECS
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            commit_timeout_secs: default_commit_timeout(),
            utc_offset_minutes: 0,
        }
    }
}

/// `[store]` section: establishment info printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Tax registration number.
    #[serde(default)]
    pub tax_id: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub city: Option<String>,
}

fn default_store_name() -> String {
    "Caixa POS".to_string()
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: default_store_name(),
            tax_id: None,
            address: None,
            city: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SalesSettings,

    #[serde(default)]
    pub store: StoreInfo,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, `CAIXA_CONFIG`, platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path
            .or_else(|| std::env::var_os("CAIXA_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `CAIXA_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CAIXA_DB_PATH") {
            debug!(%path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(secs) = lookup("CAIXA_COMMIT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.sales.commit_timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid CAIXA_COMMIT_TIMEOUT_SECS"),
            }
        }

        if let Some(minutes) = lookup("CAIXA_UTC_OFFSET_MINUTES") {
            match minutes.parse::<i32>() {
                Ok(minutes) => self.sales.utc_offset_minutes = minutes,
                Err(_) => warn!(value = %minutes, "Ignoring invalid CAIXA_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(name) = lookup("CAIXA_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(filter) = lookup("CAIXA_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.sales.commit_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sales.commit_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.sales.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "sales.utc_offset_minutes must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES, self.sales.utc_offset_minutes
            )));
        }

        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name is required".into()));
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "caixa", "pos").map(|dirs| dirs.config_dir().join("caixa.toml"))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    /// Budget for one sale commit.
    pub fn commit_budget(&self) -> Duration {
        Duration::from_secs(self.sales.commit_timeout_secs)
    }

    /// Reference offset for sale day bounds.
    pub fn reference_offset(&self) -> ConfigResult<FixedOffset> {
        FixedOffset::east_opt(self.sales.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes out of range: {}",
                self.sales.utc_offset_minutes
            ))
        })
    }

    /// Database file, creating the platform data directory when needed.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.caixa.pos/caixa.db`
    /// - **Windows**: `%APPDATA%\caixa\pos\data\caixa.db`
    /// - **Linux**: `~/.local/share/caixa-pos/caixa.db`
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "caixa", "pos").ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join("caixa.db"))
    }

    /// Pool settings for [`caixa_db::Database::new`].
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs)))
    }
}

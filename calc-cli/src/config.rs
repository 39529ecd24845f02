use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calc_core::format::Locale;
use calc_core::store::{DEFAULT_HISTORY_CAP, StoreConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "calc.toml";

/// SQLite file used for saved results when the config names no store.
pub const DEFAULT_RESULTS_DB: &str = "calc-results.db";

/// Settings read from a TOML file. Every key is optional.
///
/// ```toml
/// locale = "it"
/// history_cap = 20
/// rate_tables = "rate_tables.csv"
///
/// [store]
/// backend = "sqlite"
/// connection_string = "results.db"
///
/// [logging]
/// level = "debug"
/// file = "calc.log"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub locale: Locale,
    /// Saved results kept per namespace.
    pub history_cap: usize,
    pub store: StoreConfig,
    /// CSV file whose tables replace the built-in defaults.
    pub rate_tables: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            history_cap: DEFAULT_HISTORY_CAP,
            store: StoreConfig {
                backend: "sqlite".to_string(),
                connection_string: DEFAULT_RESULTS_DB.to_string(),
                ..StoreConfig::default()
            },
            rate_tables: None,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive. Ignored when `RUST_LOG` is set.
    pub level: Option<String>,
    /// Append log records to this file as well.
    pub file: Option<PathBuf>,
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            file: None,
            stderr: true,
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `path`, or [`DEFAULT_CONFIG_FILE`] when `None`.
    ///
    /// A file that does not exist yields the defaults; a file that exists
    /// but cannot be parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }
}

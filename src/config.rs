//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then environment variables, then command-line overrides applied by the
//! CLI. [`Config::validate`] runs last.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CHUNK_SIZE, DEFAULT_FOCUS_DELAY_MS,
    DEFAULT_PAGE_SIZE, DEFAULT_RENDER_BATCH_SIZE, ENV_CHUNK_SIZE, ENV_PAGE_SIZE, ENV_STORE_PATH,
    STORE_FILE_NAME, columns,
};
use crate::error::{CustomerMapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// Ingestion pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Rows validated per chunk before yielding
    pub chunk_size: usize,

    /// Logical column names matched against input headers
    pub columns: ColumnNames,
}

/// Logical column names, matched case-insensitively as header substrings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub accno: String,
    pub name: String,
    pub longitude: String,
    pub latitude: String,
    pub tariff_code: String,
    pub kw_or_hp: String,
    pub consumer_status: String,
    pub phase: String,
    pub meter_no: String,
    pub consumption: String,
    pub reading_month: String,
}

/// Persistent store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file path; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

/// Read-side settings for the query facade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Records returned by the initial page and searches
    pub page_size: usize,

    /// Delay before a single search result is focused
    pub focus_delay_ms: u64,

    /// Records per cursor page when streaming to a renderer
    pub render_batch_size: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            columns: ColumnNames::default(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            accno: columns::ACCOUNT_NUMBER.to_string(),
            name: columns::NAME.to_string(),
            longitude: columns::LONGITUDE.to_string(),
            latitude: columns::LATITUDE.to_string(),
            tariff_code: columns::TARIFF_CODE.to_string(),
            kw_or_hp: columns::KW_OR_HP.to_string(),
            consumer_status: columns::CONSUMER_STATUS.to_string(),
            phase: columns::PHASE.to_string(),
            meter_no: columns::METER_NUMBER.to_string(),
            consumption: columns::CONSUMPTION.to_string(),
            reading_month: columns::READING_MONTH.to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            focus_delay_ms: DEFAULT_FOCUS_DELAY_MS,
            render_batch_size: DEFAULT_RENDER_BATCH_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }
}

impl Config {
    /// Default config file location (~/.config/customer-map/config.toml)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| CustomerMapError::configuration("Could not determine config directory"))
    }

    /// Default snapshot location (<data_dir>/customer-map/store.json)
    pub fn default_store_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(STORE_FILE_NAME))
            .ok_or_else(|| CustomerMapError::configuration("Could not determine data directory"))
    }

    /// Load a configuration file in TOML format
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CustomerMapError::configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            CustomerMapError::configuration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load with layered configuration (defaults -> file -> environment)
    ///
    /// Without an explicit file the default config path is used if present.
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Ok(path) if path.exists() => {
                    debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STORE_PATH) {
            debug!("Store path overridden by {}", ENV_STORE_PATH);
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(ENV_CHUNK_SIZE) {
            self.ingest.chunk_size = parse_env_usize(ENV_CHUNK_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_PAGE_SIZE) {
            self.query.page_size = parse_env_usize(ENV_PAGE_SIZE, &value)?;
        }
        Ok(())
    }

    /// Resolve the snapshot path, falling back to the platform default
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Self::default_store_path(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(CustomerMapError::configuration(
                "ingest.chunk_size must be greater than zero",
            ));
        }
        if self.query.page_size == 0 {
            return Err(CustomerMapError::configuration(
                "query.page_size must be greater than zero",
            ));
        }
        if self.query.render_batch_size == 0 {
            return Err(CustomerMapError::configuration(
                "query.render_batch_size must be greater than zero",
            ));
        }
        let names = &self.ingest.columns;
        for (field, value) in [
            ("accno", &names.accno),
            ("name", &names.name),
            ("longitude", &names.longitude),
            ("latitude", &names.latitude),
        ] {
            if value.trim().is_empty() {
                return Err(CustomerMapError::configuration(format!(
                    "ingest.columns.{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Use a specific snapshot path
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = Some(path.into());
        self
    }

    /// Use a custom chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.ingest.chunk_size = chunk_size;
        self
    }

    /// Use a custom page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.query.page_size = page_size;
        self
    }

    /// Use a custom auto-focus delay
    pub fn with_focus_delay_ms(mut self, delay_ms: u64) -> Self {
        self.query.focus_delay_ms = delay_ms;
        self
    }

    /// Use a custom log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }
}

fn parse_env_usize(key: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        CustomerMapError::configuration(format!(
            "{} must be a positive integer, got '{}'",
            key, value
        ))
    })
}

//! TOML-based configuration for adlens.
//!
//! Supports a config file (adlens.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! url = "${ADLENS_DB}"          # SQLite path or file: URI
//! pool_size = 4
//! query_timeout_ms = 5000
//! busy_timeout_ms = 250
//! max_retries = 2
//! retry_backoff_ms = 50
//!
//! [data]
//! sample_csv = "data/sample_data.csv"
//! load_on_start = true
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Environment variable that points at the config file.
pub const CONFIG_ENV_VAR: &str = "ADLENS_CONFIG";

const LOCAL_CONFIG: &str = "adlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Storage backend settings.
    pub database: DatabaseSettings,

    /// Sample data bootstrap.
    pub data: DataSettings,

    /// HTTP surface.
    pub server: ServerSettings,
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite path or `file:` URI (supports ${ENV_VAR} expansion).
    ///
    /// When unset, each process gets its own shared-cache in-memory database.
    pub url: Option<String>,

    /// Maximum pooled connections.
    pub pool_size: usize,

    /// Per-query deadline.
    pub query_timeout_ms: u64,

    /// How long SQLite waits on a locked database before reporting busy.
    /// Kept below `query_timeout_ms` so busy errors surface as retryable.
    pub busy_timeout_ms: u64,

    /// Retries for transient backend errors (busy/locked, pool exhaustion).
    pub max_retries: u32,

    /// Base delay between retries; doubles on each attempt.
    pub retry_backoff_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 4,
            query_timeout_ms: 5000,
            busy_timeout_ms: 250,
            max_retries: 2,
            retry_backoff_ms: 50,
        }
    }
}

impl DatabaseSettings {
    /// Get the database URL with environment variables expanded.
    pub fn resolved_url(&self) -> SettingsResult<Option<String>> {
        self.url.as_deref().map(expand_env_vars).transpose()
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Sample data bootstrap settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV file loaded into the star schema at start-up.
    pub sample_csv: Option<String>,

    /// Whether to create the schema and load `sample_csv` on start-up.
    pub load_on_start: bool,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            sample_csv: None,
            load_on_start: true,
        }
    }
}

impl DataSettings {
    /// Get the sample CSV path with environment variables expanded.
    pub fn resolved_sample_csv(&self) -> SettingsResult<Option<PathBuf>> {
        Ok(self
            .sample_csv
            .as_deref()
            .map(expand_env_vars)
            .transpose()?
            .map(PathBuf::from))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind, `host:port`.
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> SettingsResult<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `ADLENS_CONFIG`
    /// 2. `./adlens.toml`
    /// 3. `~/.adlens/adlens.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".adlens").join(LOCAL_CONFIG);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values the backend cannot work with.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.database.pool_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "database.pool_size must be at least 1".into(),
            ));
        }
        if self.database.query_timeout_ms == 0 {
            return Err(SettingsError::InvalidConfig(
                "database.query_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.database.busy_timeout_ms >= self.database.query_timeout_ms {
            return Err(SettingsError::InvalidConfig(
                "database.busy_timeout_ms must be less than database.query_timeout_ms".into(),
            ));
        }
        if self.server.bind.trim().is_empty() {
            return Err(SettingsError::InvalidConfig("server.bind is empty".into()));
        }
        Ok(())
    }
}

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut missing = None;
    let expanded = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}

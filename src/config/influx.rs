//! InfluxDB connection configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::validation::{ConfigError, expand_env_vars, expand_vars_with, parse_duration};

// =============================================================================
// Constants
// =============================================================================

/// Default number of points per write request.
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Default maximum age of a buffered point before it is flushed (1 second).
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Default HTTP request timeout (5 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default write channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Environment variable holding the server URL.
pub const ENV_URL: &str = "INFLUXDB_URL";
/// Environment variable holding the API token.
pub const ENV_TOKEN: &str = "INFLUXDB_TOKEN";
/// Environment variable holding the organization.
pub const ENV_ORG: &str = "INFLUXDB_ORG";
/// Environment variable holding the target database (bucket).
pub const ENV_DATABASE: &str = "INFLUXDB_DATABASE";
/// Environment variable holding the timestamp precision.
pub const ENV_PRECISION: &str = "INFLUXDB_PRECISION";
/// Environment variable holding the batch size.
pub const ENV_BATCH_SIZE: &str = "INFLUXDB_BATCH_SIZE";
/// Environment variable holding the flush interval.
pub const ENV_FLUSH_INTERVAL: &str = "INFLUXDB_FLUSH_INTERVAL";
/// Environment variable holding the request timeout.
pub const ENV_TIMEOUT: &str = "INFLUXDB_TIMEOUT";

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval() -> Duration {
    DEFAULT_FLUSH_INTERVAL
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

// =============================================================================
// Precision
// =============================================================================

/// Timestamp precision used on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Precision {
    /// Nanoseconds.
    #[default]
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
}

// =============================================================================
// InfluxConfig
// =============================================================================

/// Connection and write-path settings for an InfluxDB v2 server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// Server base URL (e.g., `http://localhost:8086`).
    pub url: String,

    /// API token sent as `Authorization: Token <token>`.
    pub token: String,

    /// Organization name (default: empty).
    #[serde(default)]
    pub org: String,

    /// Target bucket.
    #[serde(alias = "database")]
    pub bucket: String,

    /// Timestamp precision (default: ns).
    #[serde(default)]
    pub precision: Precision,

    /// Points per write request (default: 5000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum buffering time before a flush (default: 1s).
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub flush_interval: Duration,

    /// HTTP request timeout (default: 5s).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Capacity of the write channel (default: 10000).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl InfluxConfig {
    /// Create a configuration with default write-path settings.
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: String::new(),
            bucket: bucket.into(),
            precision: Precision::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the organization.
    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = org.into();
        self
    }

    /// Set the timestamp precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the write channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingVariable` if `INFLUXDB_URL`, `INFLUXDB_TOKEN`
    /// or `INFLUXDB_DATABASE` is unset, and `ConfigError::ValidationError` if any
    /// value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
        };

        let mut config = Self::new(
            required(ENV_URL)?,
            required(ENV_TOKEN)?,
            required(ENV_DATABASE)?,
        );

        if let Some(org) = lookup(ENV_ORG) {
            config.org = org;
        }
        if let Some(precision) = lookup(ENV_PRECISION) {
            config.precision = precision.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{ENV_PRECISION}: unknown precision '{precision}'"
                ))
            })?;
        }
        if let Some(size) = lookup(ENV_BATCH_SIZE) {
            config.batch_size = size.trim().parse().map_err(|e| {
                ConfigError::ValidationError(format!("{ENV_BATCH_SIZE}: {e}"))
            })?;
        }
        if let Some(interval) = lookup(ENV_FLUSH_INTERVAL) {
            config.flush_interval = parse_duration(&interval)
                .map_err(|e| ConfigError::ValidationError(format!("{ENV_FLUSH_INTERVAL}: {e}")))?;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            config.timeout = parse_duration(&timeout)
                .map_err(|e| ConfigError::ValidationError(format!("{ENV_TIMEOUT}: {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded from the process
    /// environment before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse_yaml(&expand_env_vars(&content))
    }

    /// Parse YAML content, expanding `${VAR}` references through `lookup`.
    pub fn from_yaml_str<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::parse_yaml(&expand_vars_with(content, lookup))
    }

    fn parse_yaml(expanded: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "url must start with http:// or https://: '{}'",
                self.url
            )));
        }

        if self.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "bucket must not be empty".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "batch_size must be positive".to_string(),
            ));
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "channel_capacity must be positive".to_string(),
            ));
        }

        if self.flush_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "flush_interval must be positive".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

//! Configuration module.
//!
//! Provides connection settings for the InfluxDB write path:
//! - Explicit construction via [`InfluxConfig::new`]
//! - Environment resolution via [`InfluxConfig::from_env`] / [`InfluxConfig::from_lookup`]
//! - YAML files via [`InfluxConfig::load`]

mod influx;
mod validation;

pub use influx::{InfluxConfig, Precision};
pub use validation::{ConfigError, expand_env_vars, expand_vars_with, parse_duration};

// Re-export constants
pub use influx::{
    DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY, DEFAULT_FLUSH_INTERVAL, DEFAULT_TIMEOUT,
    ENV_BATCH_SIZE, ENV_DATABASE, ENV_FLUSH_INTERVAL, ENV_ORG, ENV_PRECISION, ENV_TIMEOUT,
    ENV_TOKEN, ENV_URL,
};

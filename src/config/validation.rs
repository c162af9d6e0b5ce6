//! Configuration parsing and validation utilities.

use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A required setting is absent from the environment.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `100ms`, etc.
///
/// # Examples
///
/// ```
/// use stats_collector::config::parse_duration;
///
/// assert_eq!(parse_duration("1s").unwrap().as_millis(), 1000);
/// assert_eq!(parse_duration("250ms").unwrap().as_millis(), 250);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    expand_vars_with(input, |name| std::env::var(name).ok())
}

/// Expand `${VAR}` references using the given lookup instead of the process environment.
pub fn expand_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    static VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            lookup(&caps[1]).unwrap_or_else(|| default_value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_valid() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("30").is_err());
    }

    #[test]
    fn test_expand_vars_no_vars() {
        assert_eq!(expand_vars_with("plain", |_| None), "plain");
    }

    #[test]
    fn test_expand_vars_with_default() {
        let result = expand_vars_with("${MISSING_TOKEN:-fallback}", |_| None);
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_vars_from_lookup() {
        let result = expand_vars_with("Token ${INFLUX_TOKEN}", |name| {
            (name == "INFLUX_TOKEN").then(|| "s3cret".to_string())
        });
        assert_eq!(result, "Token s3cret");
    }

    #[test]
    fn test_expand_env_vars_unset_without_default() {
        assert_eq!(expand_env_vars("${STATS_COLLECTOR_UNSET_VAR_9431}"), "");
    }
}

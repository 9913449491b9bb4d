//! Application configuration loaded from environment variables.

use std::fmt;
use std::str::FromStr;

use saga::DEFAULT_MAX_CASCADE_DEPTH;

use crate::error::AppError;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Kernel configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `STRICT_EVENTS`: panic on unregistered events instead of warning (default: `false`)
/// - `MAX_CASCADE_DEPTH`: saga cascade rounds allowed per coordination (default: `16`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub strict_events: bool,
    pub max_cascade_depth: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults
    /// for unset keys.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a key to its value.
    ///
    /// Unset keys take their defaults. A key that is set to something
    /// unparseable is an error rather than silently defaulted.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        Ok(Self {
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT")?.unwrap_or(defaults.log_format),
            strict_events: match lookup("STRICT_EVENTS") {
                Some(value) => parse_flag(&value).ok_or_else(|| AppError::InvalidConfig {
                    key: "STRICT_EVENTS",
                    value,
                    reason: "expected true or false".to_string(),
                })?,
                None => defaults.strict_events,
            },
            max_cascade_depth: parse(&lookup, "MAX_CASCADE_DEPTH")?
                .unwrap_or(defaults.max_cascade_depth),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            strict_events: false,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| AppError::InvalidConfig {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.strict_events);
        assert_eq!(config.max_cascade_depth, 16);
    }

    #[test]
    fn test_unset_keys_use_defaults() {
        assert_eq!(config_from(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_reads_every_key() {
        let config = config_from(&[
            ("RUST_LOG", "debug,domain=trace"),
            ("LOG_FORMAT", "JSON"),
            ("STRICT_EVENTS", "true"),
            ("MAX_CASCADE_DEPTH", "4"),
        ])
        .unwrap();

        assert_eq!(config.log_level, "debug,domain=trace");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.strict_events);
        assert_eq!(config.max_cascade_depth, 4);
    }

    #[test]
    fn test_flag_spellings() {
        for (raw, expected) in [("1", true), ("on", true), ("no", false), ("FALSE", false)] {
            let config = config_from(&[("STRICT_EVENTS", raw)]).unwrap();
            assert_eq!(config.strict_events, expected, "{raw}");
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[("MAX_CASCADE_DEPTH", "deep")]).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidConfig { key: "MAX_CASCADE_DEPTH", ref value, .. } if value == "deep"
        ));

        let err = config_from(&[("LOG_FORMAT", "xml")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration LOG_FORMAT=xml: unknown log format 'xml'"
        );

        assert!(config_from(&[("STRICT_EVENTS", "maybe")]).is_err());
    }

    #[test]
    fn test_log_format_display() {
        assert_eq!(LogFormat::Pretty.to_string(), "pretty");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}

//! Configuration types shared by the library and the CLI.

use clap::ValueEnum;
use log::LevelFilter;

use crate::config::constants::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HTTP_TIMEOUT_SECS};

/// Log verbosity selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Normal operational output.
    Info,
    /// Detailed diagnostic output.
    Debug,
    /// Everything, including per-request internals.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable colored output.
    Plain,
    /// One JSON object per line, for machine consumption.
    Json,
}

/// Client configuration resolved from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL shared by the lookup service and the history store.
    pub base_url: String,
    /// Bearer token attached to every request, if the API requires one.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// User-Agent header value for outbound requests.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_seconds: HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.token, None);
        assert_eq!(config.timeout_seconds, HTTP_TIMEOUT_SECS);
        assert!(config.user_agent.starts_with("ip_atlas/"));
    }

    #[test]
    fn log_level_converts_to_level_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::Error);
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::Warn);
        assert_eq!(LevelFilter::from(LogLevel::Info), LevelFilter::Info);
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::Debug);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::Trace);
    }
}

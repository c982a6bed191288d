//! Logger and HTTP client initialization.

use std::io::Write;
use std::time::Duration;

use colored::*;
use log::{Level, LevelFilter};
use reqwest::ClientBuilder;
use serde_json::json;

use crate::config::{Config, LogFormat, TCP_CONNECT_TIMEOUT_SECS};
use crate::error_handling::InitializationError;

fn level_color(level: Level) -> ColoredString {
    match level {
        Level::Error => level.to_string().red(),
        Level::Warn => level.to_string().yellow(),
        Level::Info => level.to_string().green(),
        Level::Debug => level.to_string().blue(),
        Level::Trace => level.to_string().purple(),
    }
}

fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::Error => "❌",
        Level::Warn => "⚠️",
        Level::Info => "✔️",
        Level::Debug => "🔍",
        Level::Trace => "🔬",
    }
}

/// Initializes the logger with the given level and format.
///
/// `RUST_LOG` is read as the starting point, then `level` overrides it, so
/// `--log-level debug` wins over the environment. Per-query chatter from
/// sqlx is held back to warnings; reqwest and hyper stay at info.
///
/// Plain format prints an emoji prefix, the target in cyan, and a colored
/// level tag. Json format emits one `{ts, level, target, msg}` object per
/// line.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger was already
/// installed for this process.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    colored::control::set_override(true);

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("sqlx", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("ip_atlas", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = json!({
                    "ts": chrono::Utc::now().timestamp_millis(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{line}")
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {} [{}] {}",
                    level_emoji(record.level()),
                    record.target().cyan(),
                    level_color(record.level()),
                    record.args()
                )
            });
        }
    }

    // try_init so repeated initialization in tests errors instead of panicking
    builder.try_init()?;

    Ok(())
}

/// Initializes the HTTP client used for all API calls.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the config
/// - Per-request timeout from the config
/// - A separate TCP connect timeout, so unreachable hosts fail fast
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(config: &Config) -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

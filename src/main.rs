//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `ip_atlas` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};

use ip_atlas::app::{self, output};
use ip_atlas::config::{
    DEFAULT_BASE_URL, DEFAULT_DB_PATH, DEFAULT_GEO_BASE, DEFAULT_SERVE_PORT, ENV_BASE_URL,
    ENV_TOKEN, HTTP_TIMEOUT_SECS,
};
use ip_atlas::initialization::init_logger_with;
use ip_atlas::store_server::{start_store_server, ServeConfig};
use ip_atlas::{Config, LogFormat, LogLevel, LookupSession};

#[derive(Debug, Parser)]
#[command(
    name = "ip_atlas",
    version,
    about = "IP geolocation lookups with a server-backed history"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Base URL of the lookup service and history store
    /// (falls back to IP_ATLAS_BASE_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token for the API (falls back to IP_ATLAS_TOKEN).
    #[arg(long, global = true)]
    token: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = HTTP_TIMEOUT_SECS)]
    timeout_seconds: u64,

    /// Log verbosity.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up IP addresses, or your own IP when none are given.
    Lookup {
        /// IPv4 or IPv6 addresses to look up.
        queries: Vec<String>,
    },

    /// Show the stored lookup history.
    History,

    /// Delete history entries after confirmation.
    Delete {
        /// Record ids or IP addresses to delete.
        targets: Vec<String>,

        /// Select every stored entry.
        #[arg(long, conflicts_with = "targets")]
        all: bool,

        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Run the bundled history store server.
    Serve {
        /// Port to listen on (binds 127.0.0.1).
        #[arg(long, default_value_t = DEFAULT_SERVE_PORT)]
        port: u16,

        /// SQLite database file backing the history.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Require this bearer token on every request.
        #[arg(long)]
        require_token: Option<String>,

        /// Geolocation provider to proxy lookups to.
        #[arg(long, default_value = DEFAULT_GEO_BASE)]
        geo_base: String,

        /// Token for the geolocation provider.
        #[arg(long)]
        geo_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    init_logger_with(cli.global.log_level.into(), cli.global.log_format)
        .context("Failed to initialize logger")?;

    let config = resolve_config(&cli.global);

    let result = match cli.command {
        Command::Lookup { queries } => cmd_lookup(&config, &queries).await,
        Command::History => cmd_history(&config).await,
        Command::Delete { targets, all, yes } => cmd_delete(&config, &targets, all, yes).await,
        Command::Serve {
            port,
            db,
            require_token,
            geo_base,
            geo_token,
        } => {
            start_store_server(ServeConfig {
                port,
                db_path: db,
                require_token,
                geo_base,
                geo_token,
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("ip_atlas error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

/// Resolves client configuration from flags, environment, and defaults.
fn resolve_config(args: &GlobalArgs) -> Config {
    let base_url = args
        .base_url
        .clone()
        .or_else(|| std::env::var(ENV_BASE_URL).ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let token = args.token.clone().or_else(|| std::env::var(ENV_TOKEN).ok());
    Config {
        base_url,
        token,
        timeout_seconds: args.timeout_seconds,
        ..Config::default()
    }
}

async fn cmd_lookup(config: &Config, queries: &[String]) -> Result<()> {
    let mut session = LookupSession::new(config)?;

    if queries.is_empty() {
        let outcome = session.start().await.context("own-IP lookup failed")?;
        output::print_ip_info(&outcome.info);
    } else {
        if let Err(e) = session.resync().await {
            warn!("could not load stored history up front: {e}");
        }
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        for query in queries {
            let Some(ip) = app::validate_ip_query(query) else {
                failed += 1;
                continue;
            };
            // show what the history already knows while the fresh lookup runs
            if session.recall(&ip).is_some() {
                if let Some(cached) = session.displayed() {
                    info!("cached result for {ip}:");
                    output::print_ip_info(cached);
                }
            }
            match session.lookup(Some(&ip)).await {
                Ok(outcome) => {
                    succeeded += 1;
                    output::print_ip_info(&outcome.info);
                    if !outcome.created {
                        info!("History updated for {ip}");
                    }
                }
                Err(e) => {
                    failed += 1;
                    error!("lookup for {ip} failed: {e}");
                }
            }
        }
        if succeeded == 0 && failed > 0 {
            output::print_error_summary(session.error_stats());
            bail!("all {failed} lookups failed");
        }
    }

    output::print_history(session.records(), session.selection(), session.active());
    output::print_error_summary(session.error_stats());
    Ok(())
}

async fn cmd_history(config: &Config) -> Result<()> {
    let mut session = LookupSession::new(config)?;
    session.resync().await.context("could not load history")?;
    output::print_history(session.records(), session.selection(), session.active());
    Ok(())
}

async fn cmd_delete(config: &Config, targets: &[String], all: bool, yes: bool) -> Result<()> {
    if !all && targets.is_empty() {
        bail!("nothing to delete: pass record ids/IPs or --all");
    }

    let mut session = LookupSession::new(config)?;
    session.resync().await.context("could not load history")?;

    if all {
        session.select_all();
    } else {
        for target in targets {
            if let Some(id) = app::resolve_selection_token(session.records(), target) {
                session.toggle_selection(id);
            }
        }
    }

    if session.selection().is_empty() {
        bail!("none of the requested records can be deleted");
    }

    let plan = session.begin_deletion()?;
    let count = plan.len();
    println!(
        "About to delete {} history entr{}:",
        count,
        if count == 1 { "y" } else { "ies" }
    );
    for id in plan.cache_ids() {
        if let Some(record) = session.records().iter().find(|record| record.id == id) {
            println!("  {:>10}  {}", id.to_string(), record.ip);
        }
    }

    let confirmed = yes
        || app::confirm(&format!(
            "Are you sure you want to delete {} history item{}? [y/N] ",
            count,
            if count == 1 { "" } else { "s" }
        ))?;
    if !confirmed {
        session.cancel_deletion();
        println!("Deletion cancelled.");
        return Ok(());
    }

    let report = session.confirm_deletion().await?;
    println!(
        "Deleted {} history entr{}.",
        report.removed,
        if report.removed == 1 { "y" } else { "ies" }
    );
    if report.display_refreshed {
        if let Some(info) = session.displayed() {
            output::print_ip_info(info);
        }
    }
    output::print_history(session.records(), session.selection(), session.active());
    output::print_error_summary(session.error_stats());
    Ok(())
}

//! # Bazaar: classifieds marketplace backend
//!
//! Serves confirmation links and delivers owner notifications.
//!
//! Usage:
//!   bazaar                          # Start with ~/.bazaar/config.toml
//!   bazaar --config ./bazaar.toml   # Custom config
//!   bazaar --port 8080 -v           # Override port, debug logging

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bazaar_accounts::{AccountsContext, Argon2Hasher, MemoryGoodRepo, MemoryUserRepo, build_executor};
use bazaar_channels::{EmailWriter, TelegramWriter};
use bazaar_core::{BazaarConfig, TaskTokenStore};
use bazaar_gateway::AppState;
use bazaar_scheduler::{MemoryTaskStore, Notifier, SqliteTaskStore, spawn_token_reaper};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 5] = [
    "bazaar",
    "bazaar_scheduler",
    "bazaar_channels",
    "bazaar_accounts",
    "bazaar_gateway",
];

#[derive(Parser)]
#[command(
    name = "bazaar",
    version,
    about = "Bazaar marketplace backend: confirmation links and owner notifications"
)]
struct Cli {
    /// Config file (default: ~/.bazaar/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Gateway port, overriding the config
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

fn log_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut parts: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    if verbose {
        parts.push("tower_http=debug".into());
    }
    parts.join(",")
}

fn open_store(config: &BazaarConfig) -> Result<Arc<dyn TaskTokenStore>> {
    let tokens = &config.tokens;
    let store: Arc<dyn TaskTokenStore> = match tokens.backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory token store; pending links die with the process");
            match tokens.ttl() {
                Some(ttl) => Arc::new(MemoryTaskStore::with_ttl(ttl)),
                None => Arc::new(MemoryTaskStore::new()),
            }
        }
        _ => {
            let path = expand_path(&tokens.path);
            Arc::new(SqliteTaskStore::open(Path::new(&path), tokens.ttl())?)
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose))),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => BazaarConfig::load_from(Path::new(&expand_path(path)))?,
        None => BazaarConfig::load()?,
    };
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    tracing::info!("Starting {} (links under {})", config.name, config.domain);

    let store = open_store(&config)?;
    let executor = build_executor(store.clone())?;

    let mail = match config.channel.email.as_ref().filter(|c| c.enabled) {
        Some(email) => {
            let writer = EmailWriter::new(email)?;
            tracing::info!("Email channel enabled via {}", email.smtp_host);
            Some(Notifier::new(Arc::new(writer), executor.clone(), &config.domain))
        }
        None => None,
    };
    let telegram = match config.channel.telegram.as_ref().filter(|c| c.enabled) {
        Some(tg) => {
            let writer = TelegramWriter::new(tg)?;
            tracing::info!("Telegram channel enabled");
            Some(Notifier::new(Arc::new(writer), executor.clone(), &config.domain))
        }
        None => None,
    };
    if mail.is_none() && telegram.is_none() {
        tracing::warn!("No delivery channel enabled; confirmation links cannot be sent");
    }

    let ctx = Arc::new(AccountsContext {
        users: Arc::new(MemoryUserRepo::new()),
        goods: Arc::new(MemoryGoodRepo::new()),
        hasher: Arc::new(Argon2Hasher),
        mail,
        telegram,
    });

    if config.tokens.ttl().is_some() && config.tokens.purge_interval_secs > 0 {
        spawn_token_reaper(store, Duration::from_secs(config.tokens.purge_interval_secs));
    }

    bazaar_gateway::start(&config.gateway, AppState::new(executor, ctx)).await
}

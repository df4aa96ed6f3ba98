//! Exitcheck - is an address a known Tor exit relay?

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use exitcheck_core::{ExitListService, UpdateMode};
use exitcheck_fetch::ExitListClient;
use exitcheck_storage::{FileStore, ListStore, MemoryStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{Config, StorageBackendKind};

/// Exitcheck - look up addresses in the cached Tor exit-relay list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "EXITCHECK_CONFIG")]
    config: String,

    /// Address list file
    #[arg(long, env = "EXITCHECK_LIST_PATH")]
    list_path: Option<String>,

    /// Refresh timestamp file
    #[arg(long, env = "EXITCHECK_TIMESTAMP_PATH")]
    timestamp_path: Option<String>,

    /// Keep the list in memory only
    #[arg(long)]
    memory: bool,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, env = "EXITCHECK_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the exit list
    List {
        /// Refresh policy: auto, true or false
        #[arg(long, default_value = "auto")]
        update: UpdateMode,

        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Check whether addresses are exit relays
    Check {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Print this host's public address
    Whoami {
        /// Echo service URL to use instead of the configured one
        #[arg(long)]
        url: Option<String>,
    },
    /// Check whether this host exits through a known relay
    AmIRelay,
    /// Refresh the stored list now
    Refresh,
    /// Show the state of the stored list
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, &args);

    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting exitcheck v{}", env!("CARGO_PKG_VERSION"));

    let service = build_service(&config)?;

    match args.command {
        Command::List { update, json } => {
            let addresses = service.get_list(update).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&addresses.sorted())?);
            } else {
                print!("{}", addresses.to_lines());
            }
        }
        Command::Check { addresses } => {
            for address in addresses {
                let verdict = if service.lookup(&address).await {
                    "relay"
                } else {
                    "not-relay"
                };
                println!("{}\t{}", address, verdict);
            }
        }
        Command::Whoami { url } => {
            println!("{}", service.current_address(url.as_deref()).await);
        }
        Command::AmIRelay => {
            let answer = if service.am_i_relay().await { "yes" } else { "no" };
            println!("{}", answer);
        }
        Command::Refresh => {
            let addresses = service.refresh().await.context("Refresh failed")?;
            println!("Refreshed {} exit addresses", addresses.len());
        }
        Command::Status { json } => {
            let status = service.status().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                let last_refresh = status
                    .last_refresh
                    .to_datetime()
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!("store:        {}", status.store);
                println!("state:        {}", status.state.as_str());
                println!("addresses:    {}", status.count);
                println!("last refresh: {}", last_refresh);
            }
        }
    }

    Ok(())
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.list_path {
        config.storage.list_path = path.clone();
    }
    if let Some(path) = &args.timestamp_path {
        config.storage.timestamp_path = path.clone();
    }
    if args.memory {
        config.storage.backend = StorageBackendKind::Memory;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
}

/// Wire the store, client and service from configuration
fn build_service(config: &Config) -> Result<ExitListService> {
    let client = Arc::new(
        ExitListClient::new(config.source.client_config())
            .context("Failed to create exit-list client")?,
    );

    let store: Arc<dyn ListStore> = match config.storage.backend {
        StorageBackendKind::File => Arc::new(FileStore::new(
            &config.storage.list_path,
            &config.storage.timestamp_path,
        )),
        StorageBackendKind::Memory => Arc::new(MemoryStore::new()),
    };

    Ok(ExitListService::new(
        store,
        client.clone(),
        client,
        config.cache.service_config(),
    ))
}

/// Initialize logging on stderr, keeping stdout for results
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

//! WolfCDN - HTTP File Store
//!
//! Serves files from a content directory and accepts authenticated
//! uploads and deletes over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wolfcdn::api::{AppState, HttpServer};
use wolfcdn::auth::CredentialStore;
use wolfcdn::config::CdnConfig;
use wolfcdn::error::{Error, Result};
use wolfcdn::storage::{CapacityOracle, ContentStore, DiskCapacity, FixedCapacity};

const INIT_HEADER: &str = "\
# WolfCDN configuration
#
# Environment overrides:
#   CDN_CONTENT_DIR   replaces server.content_dir
#   CDN_BIND_ADDRESS  replaces server.bind_address
#   CDN_USERS         adds users, e.g. \"alice=secret,bob=other\"
# These may also be set in a .env file in the working directory.
#
# Upload users live under [auth.users]:
#   [auth.users]
#   alice = \"secret\"

";

/// WolfCDN - HTTP File Store
#[derive(Parser)]
#[command(name = "wolfcdn")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wolfcdn.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); defaults to logging.level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Load environment variables from this file instead of searching for `.env`
    #[arg(long)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start serving content
    Start {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "wolfcdn.toml")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Show content root, users and free space
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Pull CDN_* and RUST_LOG from .env before anything reads them
    let dotenv = wolfcdn::config::load_dotenv(cli.env_file.as_deref());

    // Initialize logging
    let level = cli.log_level.clone().unwrap_or_else(|| {
        CdnConfig::from_file(&cli.config)
            .map(|c| c.logging.level)
            .unwrap_or_else(|_| "info".to_string())
    });
    init_logging(&level);

    match dotenv {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {:?}", path),
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to load .env file: {}", e);
            return Err(e);
        }
    }

    match cli.command {
        Commands::Start { bind } => run_start(cli.config, bind).await,
        Commands::Init { output } => run_init(output),
        Commands::Validate => run_validate(cli.config),
        Commands::Info => run_info(cli.config),
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Pick the capacity probe for the content root
fn build_capacity(config: &CdnConfig) -> Result<Arc<dyn CapacityOracle>> {
    match config.storage.capacity_override_bytes {
        Some(bytes) => {
            tracing::warn!("Using fixed capacity of {} bytes", bytes);
            Ok(Arc::new(FixedCapacity(bytes)))
        }
        None => Ok(Arc::new(DiskCapacity::new(config.content_dir())?)),
    }
}

/// Start the HTTP server
async fn run_start(config_path: PathBuf, bind: Option<String>) -> Result<()> {
    let mut config = match CdnConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load configuration from {:?}: {}", config_path, e);
            return Err(e);
        }
    };
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    let store = ContentStore::new(config.content_dir());
    if let Err(e) = store.ensure_root().await {
        tracing::error!("Failed to create content directory {:?}: {}", store.root(), e);
        return Err(e.into());
    }
    tracing::info!("Serving content from {:?}", store.root());

    let capacity = match build_capacity(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Disk usage probe failed, ensure your path is valid: {}", e);
            return Err(e);
        }
    };

    let credentials = CredentialStore::from_config(&config.auth);
    if credentials.is_empty() {
        tracing::warn!("No upload users registered, POST and DELETE will be rejected");
    }

    let state = AppState::new(store, credentials, capacity);
    let server = HttpServer::new(config.server.clone(), state);
    server.start().await
}

/// Write a default configuration file
fn run_init(output: PathBuf) -> Result<()> {
    if output.exists() {
        return Err(Error::Config(format!(
            "{} already exists, refusing to overwrite",
            output.display()
        )));
    }

    let content = format!("{}{}", INIT_HEADER, toml::to_string_pretty(&CdnConfig::default())?);
    std::fs::write(&output, content)?;

    println!("Wrote default configuration to {}", output.display());
    Ok(())
}

/// Validate configuration
fn run_validate(config_path: PathBuf) -> Result<()> {
    match load_for_report(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!("  Content dir: {}", config.content_dir().display());
            println!("  Bind address: {}", config.server.bind_address);
            println!("  Upload users: {}", config.auth.users.len());
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration is invalid: {}", e);
            Err(e)
        }
    }
}

/// Show node information
fn run_info(config_path: PathBuf) -> Result<()> {
    let config = load_for_report(&config_path)?;
    let credentials = CredentialStore::new(config.auth.users.clone());

    println!("WolfCDN v{}", env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!("Content dir:  {}", config.content_dir().display());
    println!("Bind address: {}", config.server.bind_address);
    println!("CORS:         {}", if config.server.cors_enabled { "enabled" } else { "disabled" });
    println!("Users:        {}", credentials.usernames().join(", "));

    match build_capacity(&config).and_then(|c| c.available_bytes().map_err(Error::from)) {
        Ok(bytes) => println!("Available:    {} bytes ({:.2} GiB)", bytes, bytes as f64 / GIB),
        Err(e) => println!("Available:    unknown ({})", e),
    }

    Ok(())
}

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn load_for_report(path: &Path) -> Result<CdnConfig> {
    if !path.exists() {
        println!("No config file at {}, showing defaults", path.display());
    }
    CdnConfig::load(path)
}

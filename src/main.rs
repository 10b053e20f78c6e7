//! PAG Tracker daemon
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! pag-tracker
//!
//! # Start with custom config
//! pag-tracker --config /path/to/config.toml
//!
//! # Custom storage directory and port
//! pag-tracker --storage-dir /data/pag --http-port 8096
//! ```

use anyhow::Context;
use clap::Parser;
use pag_tracker::services::spawn_logging_listener;
use pag_tracker::{Config, Database, HttpServer, Services};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pag-tracker")]
#[command(about = "Project alignment, maturity and phase tracking service")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "PAG_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory
    #[arg(long, env = "PAG_TRACKER_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, env = "PAG_TRACKER_HTTP_PORT")]
    http_port: Option<u16>,

    /// Bind address
    #[arg(long, env = "PAG_TRACKER_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pag_tracker=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    // CLI overrides
    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    info!(
        storage_dir = %config.storage_dir.display(),
        http_port = config.http_port,
        "Starting pag-tracker"
    );

    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .context("Failed to create storage directory")?;

    let config_path = config.config_path();
    if !config_path.exists() {
        config.save(&config_path)?;
        info!(path = %config_path.display(), "Created default config");
    }

    let db = Arc::new(Database::open(&config.storage_dir)?);
    let stats = db.stats()?;
    info!(
        projects = stats.project_count,
        objectives = stats.objective_count,
        phases = stats.phase_count,
        "Database ready"
    );

    let services = Arc::new(Services::from_config(db, &config));
    let _audit = spawn_logging_listener(services.events.clone());

    let http_addr: SocketAddr = format!("{}:{}", config.bind_address, config.http_port)
        .parse()
        .context("Invalid bind address")?;
    let http_server = Arc::new(HttpServer::new(services, http_addr));

    info!("HTTP API available at http://{}", http_addr);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = http_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
                return Err(e.into());
            }
        }
        _ = shutdown => {}
    }

    info!("pag-tracker stopped");
    Ok(())
}

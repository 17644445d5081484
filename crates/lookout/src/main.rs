//! Lookout server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookout::bootstrap::{Bootstrap, BootstrapOptions, SqlConnector};
use lookout::config::{ConfigPersistence, ConfigStore};
use lookout::http;
use lookout_logging::{init_logging, LogConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lookout", about = "Self-hosted uptime monitor")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the web interface, starting with setup if unconfigured
    Serve {
        /// Address to listen on
        #[arg(long, env = "LOOKOUT_ADDR", default_value = "0.0.0.0:8080")]
        addr: SocketAddr,

        /// Directory holding config.yml (and the SQLite database)
        #[arg(long, env = "LOOKOUT_LOCATION", default_value = ".")]
        location: PathBuf,

        /// Pause after setup before answering, in milliseconds
        #[arg(long, env = "LOOKOUT_SETTLE_DELAY_MS", default_value_t = 2000)]
        settle_delay_ms: u64,
    },

    /// Verify that an existing config.yml reaches its database
    Check {
        #[arg(long, env = "LOOKOUT_LOCATION", default_value = ".")]
        location: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "lookout",
        verbose: cli.verbose,
    }) {
        eprintln!("Warning: failed to initialize logging: {:?}", err);
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    match command {
        Commands::Serve {
            addr,
            location,
            settle_delay_ms,
        } => runtime.block_on(serve(addr, location, settle_delay_ms)),
        Commands::Check { location } => runtime.block_on(check(location)),
    }
}

fn bootstrap_for(location: PathBuf, settle_delay: Duration) -> Bootstrap {
    let store = Arc::new(ConfigStore::new(&location));
    let options = BootstrapOptions::new(location).with_settle_delay(settle_delay);
    Bootstrap::new(store, Arc::new(SqlConnector), options)
}

async fn serve(addr: SocketAddr, location: PathBuf, settle_delay_ms: u64) -> Result<()> {
    let bootstrap = Arc::new(bootstrap_for(
        location.clone(),
        Duration::from_millis(settle_delay_ms),
    ));

    match bootstrap.resume().await {
        Ok(true) => info!(location = %location.display(), "Using existing configuration"),
        Ok(false) => info!("No configuration yet, serving setup at {}", http::SETUP_PATH),
        Err(err) => warn!(error = %err, "Existing configuration unusable, serving setup"),
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, http::router(bootstrap))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shut down");
    Ok(())
}

async fn check(location: PathBuf) -> Result<()> {
    let store = ConfigStore::new(&location);
    if !store.exists() {
        anyhow::bail!("No configuration at {}", store.path().display());
    }
    let bootstrap = bootstrap_for(location, Duration::ZERO);
    bootstrap
        .resume()
        .await
        .context("Configured database is not usable")?;
    println!("Configuration OK: {}", store.path().display());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! streamfault server binary.
//!
//! Serves the reproduction endpoints (`/fails`, `/succeeds`) and logs
//! every delivered error through tracing.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use streamfault::config::{load_config, FaultConfig};
use streamfault::dispatch::LoggingHandler;
use streamfault::http::HttpServer;
use streamfault::lifecycle::Shutdown;
use streamfault::net::Listener;
use streamfault::observability;

#[derive(Parser)]
#[command(name = "streamfault")]
#[command(about = "Client-abort race reproduction server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FaultConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    observability::logging::init(&config.observability.log_filter);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        submit_delay_ms = config.race.submit_delay_ms,
        poll_interval_ms = config.race.poll_interval_ms,
        "Configuration loaded"
    );

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config, Arc::new(LoggingHandler));
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

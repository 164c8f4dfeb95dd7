use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use passage::args::Args;
use passage::config::EnvVarConfig;
use passage::server;
use passage_core::{NotFoundAssets, ProxyProvider};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "passage=info";

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Validate arguments
    if let Err(err) = args.validate() {
        eprintln!("❌ Configuration error: {err}");
        std::process::exit(1);
    }

    init_logging(args.json_logs);
    server::print_startup_info(&args);

    let config = Arc::new(EnvVarConfig::new());
    let http_client = match config.proxy_config().build_http_client() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("❌ Failed to build HTTP client: {err}");
            std::process::exit(1);
        }
    };

    let bind_addr = match args.listen_addr() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("❌ Configuration error: {err}");
            std::process::exit(1);
        }
    };
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Failed to bind to port {}: {}", args.listen, err);
            std::process::exit(1);
        }
    };

    if !args.quiet {
        println!("✅ Passage is running on {bind_addr}");
    }
    info!(addr = %bind_addr, prefix = %config.proxy_config().prefix, "Passage started");

    if let Err(err) = server::serve(
        listener,
        config,
        Arc::new(NotFoundAssets),
        http_client,
        shutdown_signal(),
    )
    .await
    {
        error!(error = %err, "Server stopped with an error");
        std::process::exit(1);
    }

    info!("Passage stopped");
}

/// Installs the global subscriber, JSON or human-readable.
fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

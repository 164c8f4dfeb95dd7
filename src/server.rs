//! Startup banner and the accept loop.

use std::env;
use std::future::Future;
use std::io;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::connection::{Admission, ConnectionLimiter, ConnectionTracker};
use crate::{args::Args, config, env_vars};
use passage_core::request_handler::handle_request;
use passage_core::{AssetHandler, ConfigProvider, defaults};

/// Print startup banner with configuration
pub fn print_startup_info(args: &Args) {
    if args.quiet {
        // Quiet mode: only essential information
        println!(
            "🚀 Passage v{} starting on port {}",
            env!("CARGO_PKG_VERSION"),
            args.listen
        );
        return;
    }

    // Normal/verbose mode: full configuration display
    println!("🚪 {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("   {}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("📡 Network Configuration:");
    println!("   Bind Address:   {}", args.bind);
    println!("   Listen Port:    {}", args.listen);
    match config::get_max_connections() {
        0 => println!("   Connections:    unlimited"),
        max => println!("   Connections:    {max} max"),
    }
    println!();

    let proxy_config = config::get_proxy_config();
    println!("🔧 Proxy Configuration:");
    println!("   Prefix:         {}", proxy_config.prefix);
    println!("   Timeout:        {} seconds", proxy_config.timeout.as_secs());
    println!(
        "   Connect:        {} seconds",
        proxy_config.connect_timeout.as_secs()
    );
    println!("   Redirects:      {} max", proxy_config.max_redirects);
    if let Some(user_agent) = &proxy_config.user_agent {
        println!("   User-Agent:     {user_agent}");
    }

    // Show environment configuration in verbose mode
    if args.verbose {
        print_env_config();
    }

    println!();
    println!("🚀 Server starting...");
}

/// Print environment variable configuration status (used in verbose mode)
fn print_env_config() {
    println!();
    println!("🔧 Environment Variables:");

    for &var_name in env_vars::all_env_vars() {
        match env::var(var_name) {
            Ok(value) => println!("   {:<27} = {}", var_name, value),
            Err(_) => println!("   {:<27} = [NOT SET]", var_name),
        }
    }
}

/// Accepts connections until `shutdown` completes, then drains.
///
/// Each connection is served with HTTP/1.1 by [`handle_request`]. Connections
/// beyond the configured limit are closed right after accept. Once
/// `shutdown` resolves, open connections finish their in-flight request and
/// are given [`defaults::SHUTDOWN_GRACE`] to close.
pub async fn serve<C, A, F>(
    listener: TcpListener,
    config: Arc<C>,
    assets: Arc<A>,
    http_client: reqwest::Client,
    shutdown: F,
) -> io::Result<()>
where
    C: ConfigProvider + 'static,
    A: AssetHandler,
    F: Future<Output = ()>,
{
    let limiter = ConnectionLimiter::new(config.max_connections());
    let tracker = ConnectionTracker::new();
    let (stop_tx, stop_rx) = watch::channel(());
    let mut shutdown = std::pin::pin!(shutdown);

    info!(
        addr = %listener.local_addr()?,
        limited = limiter.is_enabled(),
        max_connections = limiter.max_connections(),
        "Accepting connections"
    );

    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(error = %err, "Failed to accept connection");
                    continue;
                }
            },
            () = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
        };

        let admission = limiter.admit();
        if !admission.is_admitted() {
            warn!(
                client = %addr,
                max_connections = limiter.max_connections(),
                "Connection limit reached, closing connection"
            );
            continue;
        }
        debug!(client = %addr, "New connection");

        let guard = tracker.track();
        let config = config.clone();
        let assets = assets.clone();
        let http_client = http_client.clone();
        let mut stop_rx = stop_rx.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let _permit: Admission = admission;

            let service = service_fn(move |req| {
                handle_request(req, config.clone(), assets.clone(), http_client.clone())
            });
            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            let mut conn = std::pin::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = stop_rx.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            };

            if let Err(err) = result {
                debug!(client = %addr, error = %err, "Connection error");
            }
        });
    }

    drop(listener);
    let _ = stop_tx.send(());

    if tracker.wait_for_shutdown(defaults::SHUTDOWN_GRACE).await {
        info!("All connections closed");
    } else {
        warn!(
            remaining = tracker.count(),
            "Shutdown grace period elapsed with connections still open"
        );
    }

    Ok(())
}

//! Command line argument parsing for Passage.
//!
//! This module defines the CLI interface using [`clap`] for argument parsing.
//! It provides configuration for the listening address and output verbosity;
//! proxy behaviour is configured through environment variables.
//!
//! # Example
//!
//! ```no_run
//! use passage::args::Args;
//! use clap::Parser;
//!
//! let args = Args::parse();
//! if let Err(e) = args.validate() {
//!     eprintln!("Configuration error: {}", e);
//!     std::process::exit(1);
//! }
//! ```

use clap::Parser;

/// Command line arguments for Passage.
///
/// # Fields
///
/// * `bind` - Address to listen on (default: "0.0.0.0")
/// * `listen` - Port to listen on for incoming requests
/// * `verbose` - Enable detailed configuration output
/// * `quiet` - Suppress non-essential output (conflicts with verbose)
/// * `json_logs` - Output logs in JSON format for structured logging
#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(
    long_about = "🚪 Every link leads back through the door\nA reverse proxy that fetches pages on your behalf and rewrites their links so browsing stays inside the proxy\n\nExample usage:\n  passage --listen 8080\n  passage -l 8080 -b 127.0.0.1 --verbose\n\nProxied URLs look like /assignment/<base64url of the target URL>"
)]
#[command(
    after_help = "Environment variables:\n  PROXY_PREFIX               Path prefix of proxied traffic (default: /assignment/)\n  PROXY_TIMEOUT_SECS         Seconds to wait for origin response headers (default: 30)\n  PROXY_CONNECT_TIMEOUT_SECS Origin connect timeout seconds (default: 10)\n  MAX_REDIRECTS              Redirects followed per fetch (default: 10)\n  MAX_CONNECTIONS            Concurrent connections, 0 = unlimited (default: 10000)\n  USER_AGENT                 User-agent used when the client sends none\n  RUST_LOG                   Log filter (default: passage=info)"
)]
pub struct Args {
    /// Address to bind to
    #[arg(
        long,
        short = 'b',
        help = "Bind address for listening",
        value_name = "ADDRESS",
        default_value = "0.0.0.0"
    )]
    pub bind: String,

    /// Port to listen on for incoming requests
    #[arg(
        long,
        short = 'l',
        help = "Listen port for incoming connections",
        value_name = "PORT"
    )]
    pub listen: u16,

    /// Enable verbose output
    #[arg(
        long,
        short = 'v',
        help = "Show detailed configuration and startup information"
    )]
    pub verbose: bool,

    /// Enable quiet mode (minimal output)
    #[arg(
        long,
        short = 'q',
        help = "Suppress configuration output, show only essential messages",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output logs in JSON format (for structured logging)
    #[arg(long, help = "Output logs in JSON format for structured logging")]
    pub json_logs: bool,
}

impl Args {
    /// Validates the parsed command line arguments.
    ///
    /// Performs the following validations:
    /// - The listen port must be greater than 0
    /// - Bind address must be a valid IP address
    ///
    /// # Example
    ///
    /// ```
    /// use passage::args::Args;
    /// use clap::Parser;
    ///
    /// let args = Args::try_parse_from(["passage", "-l", "0"]).unwrap();
    /// assert!(args.validate().is_err());
    ///
    /// let args = Args::try_parse_from(["passage", "-l", "8080"]).unwrap();
    /// assert!(args.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.listen == 0 {
            return Err("Listen port must be greater than 0".to_string());
        }

        if self.bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address: '{}'", self.bind));
        }

        Ok(())
    }

    /// Returns the socket address to listen on.
    ///
    /// Only meaningful after [`Args::validate`] succeeded.
    pub fn listen_addr(&self) -> Result<std::net::SocketAddr, String> {
        let ip: std::net::IpAddr = self
            .bind
            .parse()
            .map_err(|_| format!("Invalid bind address: '{}'", self.bind))?;
        Ok(std::net::SocketAddr::new(ip, self.listen))
    }
}

//! Passage - Every link leads back through the door
//!
//! A reverse proxy that fetches pages on a client's behalf and rewrites their
//! links so every follow-up request comes back through the proxy.
//!
//! # Overview
//!
//! Passage is a reverse proxy written in Rust that provides:
//! - Reversible base64url tokens carrying the target URL in the path
//! - Header sanitizing and permissive CORS on every proxied response
//! - Streaming HTML link rewriting and CSS `url()` rewriting
//! - Preflight answers that never reach the origin
//! - Structured logging with JSON support
//!
//! # Example
//!
//! ```rust,no_run
//! use passage::config;
//!
//! // Get configuration from environment
//! let proxy_config = config::get_proxy_config();
//! let client = proxy_config.build_http_client().unwrap();
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration management from environment variables
//! - [`env_vars`] - Environment variable constants
//! - [`server`] - Startup info and the accept loop
//! - [`connection`] - Connection limiting and shutdown tracking
//! - [`args`] - Command line argument parsing
//!
//! # Re-exports from passage-core
//!
//! Core functionality is provided by the `passage-core` crate:
//! - [`codec`] - URL token encoding and decoding
//! - [`rewriter`] - HTML and CSS link rewriting
//! - [`request_handler`] - HTTP request dispatching and forwarding

#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod connection;
pub mod env_vars;
pub mod server;

// Re-export passage-core modules
pub use passage_core::codec;
pub use passage_core::request_handler;
pub use passage_core::rewriter;
pub use passage_core::types;

// Re-export commonly used items at crate root
pub use config::{EnvVarConfig, get_max_connections, get_proxy_config};
pub use passage_core::{
    // Static-asset collaborator
    AssetHandler,
    // Aggregated configuration trait
    ConfigProvider,
    // Composable configuration traits
    ConnectionProvider,
    NotFoundAssets,
    // Configuration structs
    ProxyConfig,
    ProxyProvider,
};

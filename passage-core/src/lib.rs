//! Passage Core - Reusable link-rewriting proxy components
//!
//! This crate provides the core functionality for building a reverse proxy
//! that keeps browsing inside its own origin:
//! - Reversible URL tokens that fit in a single path segment
//! - Request and response header sanitizing, CORS included
//! - Preflight answers that never reach the origin
//! - Streaming HTML and buffered CSS link rewriting
//!
//! # Overview
//!
//! `passage-core` is framework-agnostic apart from the `hyper` request and
//! response types. Configuration is provided via the [`ConfigProvider`]
//! trait, and non-proxied paths are handed to an [`AssetHandler`].
//!
//! # Example
//!
//! ```rust,no_run
//! use passage_core::{ConnectionProvider, ProxyConfig, ProxyProvider};
//! use passage_core::assets::NotFoundAssets;
//! use passage_core::request_handler::handle_request;
//! use std::sync::Arc;
//!
//! // Implement your own configuration provider using composable traits
//! struct MyConfig {
//!     proxy: ProxyConfig,
//! }
//!
//! impl ProxyProvider for MyConfig {
//!     fn proxy_config(&self) -> &ProxyConfig { &self.proxy }
//! }
//!
//! impl ConnectionProvider for MyConfig {
//!     fn max_connections(&self) -> usize { 10_000 }
//! }
//!
//! let config = Arc::new(MyConfig { proxy: ProxyConfig::default() });
//! let client = config.proxy.build_http_client().unwrap();
//! let assets = Arc::new(NotFoundAssets);
//! # let _ = (config, client, assets);
//! ```
//!
//! # Modules
//!
//! - [`codec`] - URL token encoding and decoding
//! - [`headers`] - HTTP header constants and the header sanitizer
//! - [`preflight`] - `OPTIONS` handling
//! - [`rewriter`] - HTML and CSS link rewriting
//! - [`request_handler`] - HTTP request dispatching and forwarding
//! - [`assets`] - Collaborator interface for non-proxied paths
//! - [`types`] - Configuration types and the [`ConfigProvider`] trait
//! - [`error`] - Error types and result aliases

#![forbid(unsafe_code)]

pub mod assets;
pub mod body;
pub mod codec;
pub mod defaults;
pub mod error;
pub mod headers;
pub mod preflight;
pub mod request_handler;
pub mod rewriter;
#[cfg(test)]
pub mod test_utils;
pub mod types;

// Re-export commonly used items at crate root
pub use assets::{AssetHandler, NotFoundAssets};
pub use error::{PassageError, Result};
pub use types::{
    // Aggregated configuration trait
    ConfigProvider,
    // Composable configuration traits
    ConnectionProvider,
    // Configuration structs
    ProxyConfig,
    ProxyProvider,
};

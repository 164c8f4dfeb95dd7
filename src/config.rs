//! Configuration management for Passage.
//!
//! This module handles loading and caching configuration from environment variables.
//! All configurations are computed once at first access and cached for the lifetime
//! of the application using `once_cell::sync::Lazy`.
//!
//! # Caching
//!
//! Configuration values are read from environment variables only once, at startup.
//! This provides:
//! - Consistent configuration throughout the application lifetime
//! - No runtime overhead from repeated environment lookups
//! - Thread-safe access without locking
//!
//! # Example
//!
//! ```
//! use passage::config;
//!
//! let proxy_config = config::get_proxy_config();
//! println!("Prefix: {}, timeout: {:?}", proxy_config.prefix, proxy_config.timeout);
//! ```

use std::env::{self, VarError};
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::env_vars;
use passage_core::{ConnectionProvider, ProxyConfig, ProxyProvider, defaults};

// ============================================================================
// Cached Configuration (computed once at first access)
// ============================================================================

static PROXY_CONFIG: Lazy<ProxyConfig> = Lazy::new(|| compute_proxy_config(|key| env::var(key)));
static MAX_CONNECTIONS: Lazy<usize> = Lazy::new(|| compute_max_connections(|key| env::var(key)));

// ============================================================================
// Internal Helpers
// ============================================================================

/// Parses an environment variable with fallback to a default value.
///
/// Logs a warning if the value exists but cannot be parsed.
fn parse_env_var_or_default<T, F>(env_var: &F, var_name: &str, default: T) -> T
where
    T: FromStr + Copy,
    F: Fn(&str) -> Result<String, VarError>,
{
    match env_var(var_name) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = var_name, value = %value, "Invalid env var value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Reads an optional string variable, treating blank values as unset.
fn non_empty_env_var<F>(env_var: &F, var_name: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    env_var(var_name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// ============================================================================
// Public Configuration Getters
// ============================================================================

/// Returns the cached proxy configuration.
///
/// Controls routing and origin fetch behavior.
///
/// Configuration is read from environment variables on first access:
/// - `PROXY_PREFIX`: Path prefix of proxied traffic (default: `/assignment/`)
/// - `PROXY_TIMEOUT_SECS`: Wait for origin response headers (default: 30)
/// - `PROXY_CONNECT_TIMEOUT_SECS`: Origin connect timeout (default: 10)
/// - `MAX_REDIRECTS`: Redirects followed per fetch (default: 10)
/// - `USER_AGENT`: User-agent sent when the client sends none (default: unset)
///
/// # Example
///
/// ```
/// use passage::config::get_proxy_config;
///
/// let config = get_proxy_config();
/// println!("Following up to {} redirects", config.max_redirects);
/// ```
pub fn get_proxy_config() -> &'static ProxyConfig {
    &PROXY_CONFIG
}

/// Computes proxy configuration from environment variables.
/// Invalid values fall back to defaults and log warnings
fn compute_proxy_config<F>(env_var: F) -> ProxyConfig
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let prefix = non_empty_env_var(&env_var, env_vars::PROXY_PREFIX)
        .map(|prefix| ProxyConfig::normalize_prefix(&prefix))
        .unwrap_or_else(|| defaults::PROXY_PREFIX.to_string());

    let timeout_secs = parse_env_var_or_default(
        &env_var,
        env_vars::PROXY_TIMEOUT_SECS,
        defaults::PROXY_TIMEOUT_SECS,
    );

    let connect_timeout_secs = parse_env_var_or_default(
        &env_var,
        env_vars::PROXY_CONNECT_TIMEOUT_SECS,
        defaults::CONNECT_TIMEOUT_SECS,
    );

    let max_redirects =
        parse_env_var_or_default(&env_var, env_vars::MAX_REDIRECTS, defaults::MAX_REDIRECTS);

    let config = ProxyConfig {
        prefix,
        timeout: Duration::from_secs(timeout_secs),
        connect_timeout: Duration::from_secs(connect_timeout_secs),
        max_redirects,
        user_agent: non_empty_env_var(&env_var, env_vars::USER_AGENT),
    };

    // Validate configuration
    if !config.is_valid() {
        warn!(
            prefix = %config.prefix,
            timeout = ?config.timeout,
            connect_timeout = ?config.connect_timeout,
            "Invalid proxy configuration, using defaults"
        );
        return ProxyConfig {
            user_agent: config.user_agent,
            ..ProxyConfig::default()
        };
    }

    config
}

/// Returns the cached maximum number of concurrent connections.
///
/// When the limit is reached, new connections are rejected immediately.
///
/// Configuration is read from `MAX_CONNECTIONS` environment variable on first access.
///
/// # Returns
///
/// - `0`: Unlimited connections (not recommended for production)
/// - `> 0`: Maximum number of concurrent connections
///
/// **Default**: `10000`
///
/// # Example
///
/// ```
/// use passage::config::get_max_connections;
///
/// let max_conn = get_max_connections();
/// if max_conn > 0 {
///     println!("Limiting to {} concurrent connections", max_conn);
/// }
/// ```
pub fn get_max_connections() -> usize {
    *MAX_CONNECTIONS
}

/// Computes maximum connections from environment variable.
fn compute_max_connections<F>(env_var: F) -> usize
where
    F: Fn(&str) -> Result<String, VarError>,
{
    parse_env_var_or_default(&env_var, env_vars::MAX_CONNECTIONS, defaults::MAX_CONNECTIONS)
}

// ============================================================================
// EnvVarConfig - ConfigProvider implementation using environment variables
// ============================================================================

/// Configuration provider that reads from environment variables.
///
/// This is the default configuration provider for the Passage CLI.
/// All values are cached at creation time using the global lazy statics.
///
/// # Example
///
/// ```
/// use passage::config::EnvVarConfig;
/// use passage_core::ProxyProvider;
///
/// let config = EnvVarConfig::new();
/// println!("Prefix: {}", config.proxy_config().prefix);
/// ```
#[derive(Clone, Debug)]
pub struct EnvVarConfig {
    // We use references to the global lazy statics for zero-copy access
    _private: (),
}

impl EnvVarConfig {
    /// Creates a new configuration provider from environment variables.
    ///
    /// This triggers lazy initialization of all configuration values
    /// if they haven't been accessed yet.
    pub fn new() -> Self {
        Lazy::force(&PROXY_CONFIG);
        Lazy::force(&MAX_CONNECTIONS);
        Self { _private: () }
    }
}

impl Default for EnvVarConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyProvider for EnvVarConfig {
    fn proxy_config(&self) -> &ProxyConfig {
        get_proxy_config()
    }
}

impl ConnectionProvider for EnvVarConfig {
    fn max_connections(&self) -> usize {
        get_max_connections()
    }
}

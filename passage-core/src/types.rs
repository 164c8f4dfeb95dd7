//! Type definitions for Passage configuration.
//!
//! Configuration reaches the core through small provider traits, so the
//! request handler can be driven by environment variables, files or test
//! fixtures alike.

use std::time::Duration;

use crate::defaults;

// ============================================================================
// Composable Configuration Traits
// ============================================================================

/// Configuration for proxy behavior.
///
/// Implement this trait to customize the proxy prefix and origin fetches.
pub trait ProxyProvider: Send + Sync {
    /// Returns the proxy configuration.
    fn proxy_config(&self) -> &ProxyConfig;
}

/// Configuration for connection limits.
pub trait ConnectionProvider: Send + Sync {
    /// Returns the maximum number of concurrent connections (0 = unlimited).
    fn max_connections(&self) -> usize;
}

/// Trait for complete configuration injection.
///
/// Combines [`ProxyProvider`] and [`ConnectionProvider`]; any type that
/// implements both is a `ConfigProvider`.
///
/// # Example
///
/// ```
/// use passage_core::{ConnectionProvider, ProxyConfig, ProxyProvider};
///
/// struct MyConfig {
///     proxy: ProxyConfig,
/// }
///
/// impl ProxyProvider for MyConfig {
///     fn proxy_config(&self) -> &ProxyConfig { &self.proxy }
/// }
///
/// impl ConnectionProvider for MyConfig {
///     fn max_connections(&self) -> usize { 10_000 }
/// }
///
/// fn takes_config(_: &impl passage_core::ConfigProvider) {}
/// takes_config(&MyConfig { proxy: ProxyConfig::default() });
/// ```
pub trait ConfigProvider: ProxyProvider + ConnectionProvider {}

// Blanket implementation: any type implementing all sub-traits is a ConfigProvider
impl<T> ConfigProvider for T where T: ProxyProvider + ConnectionProvider {}

/// Configuration for the proxy route and origin fetches.
///
/// # Example
///
/// ```
/// use passage_core::ProxyConfig;
///
/// let config = ProxyConfig::default().with_prefix("proxy");
/// assert_eq!(config.prefix, "/proxy/");
/// assert!(config.is_valid());
/// ```
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// Path prefix that marks proxied traffic, always `/`-delimited
    pub prefix: String,
    /// Time allowed for the origin's response headers, redirects included
    pub timeout: Duration,
    /// Timeout for establishing the origin connection
    pub connect_timeout: Duration,
    /// Maximum redirects followed by the fetch layer
    pub max_redirects: usize,
    /// User-agent sent when the client did not provide one
    pub user_agent: Option<String>,
}

impl ProxyConfig {
    /// Returns `true` if the configuration is valid.
    ///
    /// A valid configuration has non-zero timeouts and a prefix other than `/`.
    pub fn is_valid(&self) -> bool {
        !self.timeout.is_zero() && !self.connect_timeout.is_zero() && self.prefix.len() > 1
    }

    /// Replaces the prefix, normalising it with [`ProxyConfig::normalize_prefix`].
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Self::normalize_prefix(prefix);
        self
    }

    /// Normalises a prefix so it starts and ends with exactly one `/`.
    ///
    /// ```
    /// use passage_core::ProxyConfig;
    ///
    /// assert_eq!(ProxyConfig::normalize_prefix("assignment"), "/assignment/");
    /// assert_eq!(ProxyConfig::normalize_prefix("//a/b//"), "/a/b/");
    /// ```
    pub fn normalize_prefix(prefix: &str) -> String {
        let trimmed = prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }

    /// Builds the HTTP client used for origin fetches.
    ///
    /// Redirects are followed inside the client, up to `max_redirects`;
    /// compressed responses are decoded before they reach the rewriters.
    /// The client carries no total deadline; `timeout` is applied by the
    /// request handler to the wait for response headers only.
    pub fn build_http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects));

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        builder.build()
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: defaults::PROXY_PREFIX.to_string(),
            timeout: defaults::PROXY_TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
            max_redirects: defaults::MAX_REDIRECTS,
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_config_default_valid() {
        let config = ProxyConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.prefix, "/assignment/");
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_proxy_config_invalid_zero_timeout() {
        let config = ProxyConfig {
            timeout: Duration::ZERO,
            ..ProxyConfig::default()
        };
        assert!(!config.is_valid());
    }

    #[test]
    fn test_proxy_config_invalid_root_prefix() {
        let config = ProxyConfig::default().with_prefix("/");
        assert_eq!(config.prefix, "/");
        assert!(!config.is_valid());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(ProxyConfig::normalize_prefix("/assignment/"), "/assignment/");
        assert_eq!(ProxyConfig::normalize_prefix("/assignment"), "/assignment/");
        assert_eq!(ProxyConfig::normalize_prefix(" p "), "/p/");
        assert_eq!(ProxyConfig::normalize_prefix(""), "/");
    }

    #[test]
    fn test_build_http_client() {
        let config = ProxyConfig {
            user_agent: Some("passage-test".into()),
            ..ProxyConfig::default()
        };
        assert!(config.build_http_client().is_ok());
    }
}

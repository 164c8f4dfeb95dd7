//! Test utilities for Passage.
//!
//! This module provides shared test configuration types used across unit tests.
//! It is only compiled when running tests (`#[cfg(test)]`).

use crate::types::{ConnectionProvider, ProxyConfig, ProxyProvider};
use std::time::Duration;

/// Shared test configuration for unit tests.
///
/// This struct implements all configuration traits with sensible defaults
/// and builder methods for customization.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub proxy: ProxyConfig,
    pub max_connections: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig {
                timeout: Duration::from_secs(10),
                connect_timeout: Duration::from_secs(5),
                ..ProxyConfig::default()
            },
            max_connections: 10_000,
        }
    }
}

impl TestConfig {
    /// Create a new test configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the proxy prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.proxy = self.proxy.with_prefix(prefix);
        self
    }

    /// Configure the response header timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.proxy.timeout = timeout;
        self
    }

    /// Configure the origin connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.proxy.connect_timeout = timeout;
        self
    }
}

impl ProxyProvider for TestConfig {
    fn proxy_config(&self) -> &ProxyConfig {
        &self.proxy
    }
}

impl ConnectionProvider for TestConfig {
    fn max_connections(&self) -> usize {
        self.max_connections
    }
}

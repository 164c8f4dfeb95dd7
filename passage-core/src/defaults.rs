//! Default configuration values for Passage.
//!
//! Centralised so the binary's environment parsing and the tests agree.

use std::time::Duration;

/// Default proxy path prefix.
pub const PROXY_PREFIX: &str = "/assignment/";

/// Default wait for origin response headers, in seconds.
pub const PROXY_TIMEOUT_SECS: u64 = 30;

/// Default wait for origin response headers.
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(PROXY_TIMEOUT_SECS);

/// Default origin connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default origin connect timeout duration.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// Default redirect chain limit.
pub const MAX_REDIRECTS: usize = 10;

/// Default maximum concurrent connections.
pub const MAX_CONNECTIONS: usize = 10_000;

/// How long in-flight connections may drain after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

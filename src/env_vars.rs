//! Environment variable names used throughout Passage configuration

/// Routing configuration
pub const PROXY_PREFIX: &str = "PROXY_PREFIX";

/// Origin fetch configuration
pub const PROXY_TIMEOUT_SECS: &str = "PROXY_TIMEOUT_SECS";
pub const PROXY_CONNECT_TIMEOUT_SECS: &str = "PROXY_CONNECT_TIMEOUT_SECS";
pub const MAX_REDIRECTS: &str = "MAX_REDIRECTS";
pub const USER_AGENT: &str = "USER_AGENT";

/// Connection management
pub const MAX_CONNECTIONS: &str = "MAX_CONNECTIONS";

/// Get all environment variable names for documentation/validation
pub fn all_env_vars() -> &'static [&'static str] {
    &[
        PROXY_PREFIX,
        PROXY_TIMEOUT_SECS,
        PROXY_CONNECT_TIMEOUT_SECS,
        MAX_REDIRECTS,
        USER_AGENT,
        MAX_CONNECTIONS,
    ]
}

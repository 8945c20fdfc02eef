//! Client configuration
//!
//! Settings applied once when a transport handle is built. Defaults come from
//! environment variables with hard-coded fallbacks.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_PREFIX: &str = "ci/api/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Coordination client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Path prefix between the server URL and the protocol endpoints
    pub api_prefix: String,
    /// Deadline for a whole request/response exchange
    pub request_timeout: Duration,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_prefix: std::env::var("RUNNER_API_PREFIX")
                .unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string()),
            request_timeout: Duration::from_secs(secs_from_env(
                "RUNNER_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(secs_from_env(
                "RUNNER_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config with a specific API prefix and built-in timeouts
    pub fn new(api_prefix: &str) -> Self {
        ClientConfig {
            api_prefix: api_prefix.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        }
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

fn secs_from_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn default_user_agent() -> String {
    format!(
        "runner-network/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new("api/v4");
        assert_eq!(config.api_prefix, "api/v4");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("runner-network/"));
    }

    #[test]
    fn test_client_config_builders() {
        let config = ClientConfig::new(DEFAULT_API_PREFIX)
            .with_request_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(1))
            .with_user_agent("custom-agent");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.user_agent, "custom-agent");
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(!config.api_prefix.is_empty());
        assert!(config.request_timeout > Duration::ZERO);
    }

    #[test]
    fn test_secs_from_env_fallback() {
        assert_eq!(secs_from_env("RUNNER_NETWORK_TEST_UNSET_VARIABLE", 7), 7);
    }
}

//! HTTP Client Construction
//!
//! Every component that talks to the network owns a `reqwest::Client` built
//! from its explicit configuration. Clients pool connections internally, so
//! cloning one per component is cheap.

use reqwest::Client;
use std::time::Duration;

use super::network_config::NodeConfig;
use crate::error::{StxError, StxResult};

/// Build an async client with the given limits
pub fn build_client(
    request_timeout: Duration,
    connect_timeout: Duration,
    user_agent: &str,
) -> StxResult<Client> {
    Client::builder()
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(5)
        .tcp_nodelay(true)
        .user_agent(user_agent)
        .build()
        .map_err(|e| StxError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Client for a node API
pub fn node_client(config: &NodeConfig) -> StxResult<Client> {
    build_client(config.request_timeout, config.connect_timeout, &config.user_agent)
}

/// First `max` characters of a response body, for error messages
pub fn body_excerpt(body: &str, max: usize) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= max {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(max).collect();
        format!("{}…", head)
    }
}

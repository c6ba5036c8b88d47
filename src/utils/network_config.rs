//! Node Endpoint Configuration
//!
//! Validates and carries the node endpoint used by the broadcaster and the
//! read clients:
//! - URL format validation
//! - TLS requirement enforcement (loopback excepted)
//! - No credentials embedded in URLs

use crate::error::{StxError, StxResult};
use crate::types::Network;
use std::time::Duration;
use url::Url;

pub const TESTNET_API_URL: &str = "https://api.testnet.hiro.so";
pub const MAINNET_API_URL: &str = "https://api.hiro.so";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_USER_AGENT: &str = concat!("stx-custody/", env!("CARGO_PKG_VERSION"));

/// Connection settings for a Stacks node API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl NodeConfig {
    /// Validate `base_url` and build a config with default timeouts
    pub fn new(base_url: &str) -> StxResult<Self> {
        Ok(Self {
            base_url: validate_endpoint(base_url)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Public Hiro endpoint for `network`
    pub fn for_network(network: Network) -> StxResult<Self> {
        match network {
            Network::Testnet => Self::new(TESTNET_API_URL),
            Network::Mainnet => Self::new(MAINNET_API_URL),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Resolve an API path against the base URL, keeping any base path prefix
    pub fn endpoint(&self, path: &str) -> StxResult<Url> {
        join_path(&self.base_url, path)
    }
}

pub(crate) fn join_path(base: &Url, path: &str) -> StxResult<Url> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| StxError::config(format!("Invalid endpoint path '{}': {}", path, e)))
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Parse and validate an endpoint URL
pub fn validate_endpoint(raw: &str) -> StxResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| StxError::config(format!("Invalid URL format: {}", e)))?;

    match url.scheme() {
        "https" => {}
        "http" if is_loopback(&url) => {}
        "http" => {
            return Err(StxError::config(format!(
                "HTTPS required for non-local endpoint: {}",
                url.host_str().unwrap_or_default()
            )))
        }
        other => return Err(StxError::config(format!("Unsupported URL scheme: {}", other))),
    }

    if url.host().is_none() {
        return Err(StxError::config("URL has no host"));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(StxError::config("Credentials must not be embedded in the URL"));
    }

    Ok(url)
}

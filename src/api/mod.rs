//! API Module
//!
//! Read-only clients for a Stacks node API: account balance/nonce and
//! paginated transaction history. Amounts arrive as integer µSTX strings.

mod accounts;
mod history;

pub use accounts::*;
pub use history::*;

use crate::error::{StxError, StxResult};
use crate::utils::{body_excerpt, node_client, NodeConfig};
use crate::wallet::StacksAddress;
use reqwest::Client;
use serde::de::DeserializeOwned;

const EXCERPT_CHARS: usize = 200;

/// GET client bound to one node
#[derive(Debug, Clone)]
pub struct NodeClient {
    client: Client,
    config: NodeConfig,
}

impl NodeClient {
    pub fn new(config: NodeConfig) -> StxResult<Self> {
        Ok(Self {
            client: node_client(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    async fn get_text(&self, path: &str) -> StxResult<String> {
        let url = self.config.endpoint(path)?;
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            return Err(StxError::transport_status(
                status,
                format!("HTTP {}: {}", status, body_excerpt(&body, EXCERPT_CHARS)),
            ));
        }
        Ok(body)
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> StxResult<T> {
    serde_json::from_str(body).map_err(|e| {
        StxError::transport(format!(
            "Malformed response body ({}): {}",
            e,
            body_excerpt(body, EXCERPT_CHARS)
        ))
    })
}

/// Reject anything that is not a valid c32 account before it reaches a URL
fn checked_address(address: &str) -> StxResult<String> {
    StacksAddress::from_c32(address.trim())
        .map(|a| a.to_c32())
        .map_err(|e| StxError::invalid_intent("address", e.to_string()))
}

//! Transaction Broadcaster
//!
//! Submits signed transfers to a Stacks node and classifies the answer:
//! a structured rejection from the chain is kept apart from transport
//! failures. Nothing here retries.

use super::types::SignedTransaction;
use crate::error::{StxError, StxResult};
use crate::types::BroadcastReceipt;
use crate::utils::logging::redact_hash;
use crate::utils::{body_excerpt, node_client, NodeConfig};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const TRANSACTIONS_PATH: &str = "/v2/transactions";
const EXCERPT_CHARS: usize = 200;

/// Structured rejection body returned by the node
#[derive(Debug, Deserialize)]
struct RejectionBody {
    error: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    reason_data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AcceptedBody {
    Txid(String),
    Object { txid: String },
}

/// Posts signed transactions to one node
#[derive(Debug, Clone)]
pub struct Broadcaster {
    client: Client,
    config: NodeConfig,
}

impl Broadcaster {
    pub fn new(config: NodeConfig) -> StxResult<Self> {
        Ok(Self {
            client: node_client(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Submit to `{base}/v2/transactions`
    pub async fn broadcast(&self, tx: &SignedTransaction) -> StxResult<BroadcastReceipt> {
        let endpoint = self.config.endpoint(TRANSACTIONS_PATH)?;
        self.broadcast_to(tx, &endpoint).await
    }

    /// Submit to an explicit endpoint
    pub async fn broadcast_to(
        &self,
        tx: &SignedTransaction,
        endpoint: &Url,
    ) -> StxResult<BroadcastReceipt> {
        let local_txid = tx.txid().to_prefixed_hex();

        let response = self
            .client
            .post(endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(tx.serialize())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| StxError::transport_status(status, format!("Unreadable response body: {}", e)))?;

        let txid = match interpret_broadcast_response(status, &body) {
            Ok(txid) => txid,
            Err(e) => {
                tracing::warn!(
                    local_txid = %redact_hash(&local_txid),
                    status,
                    error = %e,
                    "broadcast failed"
                );
                return Err(e);
            }
        };

        if txid != local_txid {
            tracing::warn!(
                txid = %redact_hash(&txid),
                local_txid = %redact_hash(&local_txid),
                "node txid differs from locally computed txid"
            );
        }
        tracing::info!(txid = %redact_hash(&txid), nonce = tx.nonce(), "broadcast accepted");

        Ok(BroadcastReceipt {
            explorer_url: Some(tx.transaction().network.explorer_tx_url(&txid)),
            txid,
            local_txid,
        })
    }
}

/// Classify a node response to a transaction submission.
///
/// Returns the accepted txid as lowercase `0x`-prefixed hex.
pub fn interpret_broadcast_response(status: u16, body: &str) -> StxResult<String> {
    if (200..300).contains(&status) {
        let accepted: AcceptedBody = serde_json::from_str(body).map_err(|_| {
            StxError::transport_status(
                status,
                format!("Malformed receipt body: {}", body_excerpt(body, EXCERPT_CHARS)),
            )
        })?;
        let raw = match accepted {
            AcceptedBody::Txid(txid) | AcceptedBody::Object { txid } => txid,
        };
        return normalize_txid(&raw).ok_or_else(|| {
            StxError::transport_status(status, format!("Receipt carries no valid txid: {}", raw))
        });
    }

    match serde_json::from_str::<RejectionBody>(body) {
        Ok(rejection) => Err(StxError::ChainRejected {
            code: rejection.error,
            reason: rejection.reason.unwrap_or_default(),
            detail: rejection.reason_data,
        }),
        Err(_) => Err(StxError::transport_status(
            status,
            format!("HTTP {}: {}", status, body_excerpt(body, EXCERPT_CHARS)),
        )),
    }
}

fn normalize_txid(raw: &str) -> Option<String> {
    let digits = raw.trim().trim_start_matches("0x");
    if digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", digits.to_ascii_lowercase()))
    } else {
        None
    }
}

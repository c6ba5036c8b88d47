//! Address transaction history

use super::{checked_address, decode_json, NodeClient};
use crate::error::{StxError, StxResult};
use serde::{Deserialize, Serialize};

/// Largest page the extended API serves
pub const MAX_HISTORY_PAGE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransferInfo {
    pub recipient_address: String,
    /// µSTX as an integer string
    pub amount: String,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Common fields of one history entry; everything else stays in `raw`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tx_id: String,
    pub tx_type: String,
    pub tx_status: String,
    #[serde(default)]
    pub nonce: Option<u64>,
    #[serde(default)]
    pub fee_rate: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub burn_block_time_iso: Option<String>,
    #[serde(default)]
    pub token_transfer: Option<TokenTransferInfo>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
    pub results: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    limit: u32,
    offset: u32,
    total: u64,
    results: Vec<serde_json::Value>,
}

/// Decode an `/extended/v1/address/{addr}/transactions` body
pub fn parse_history(body: &str) -> StxResult<HistoryPage> {
    let page: RawPage = decode_json(body)?;
    let results = page
        .results
        .into_iter()
        .map(|raw| {
            let mut entry: HistoryEntry = serde_json::from_value(raw.clone())
                .map_err(|e| StxError::transport(format!("Malformed history entry: {}", e)))?;
            entry.raw = raw;
            Ok(entry)
        })
        .collect::<StxResult<Vec<_>>>()?;

    Ok(HistoryPage {
        limit: page.limit,
        offset: page.offset,
        total: page.total,
        results,
    })
}

impl NodeClient {
    pub async fn fetch_history(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> StxResult<HistoryPage> {
        if limit == 0 || limit > MAX_HISTORY_PAGE {
            return Err(StxError::invalid_intent(
                "limit",
                format!("Page size must be 1-{}", MAX_HISTORY_PAGE),
            ));
        }
        let address = checked_address(address)?;
        let body = self
            .get_text(&format!(
                "/extended/v1/address/{}/transactions?limit={}&offset={}",
                address, limit, offset
            ))
            .await?;
        parse_history(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "limit": 2, "offset": 0, "total": 3,
        "results": [
            {
                "tx_id": "0x7fdf10363909633d006fc8ce494a11748967df2ddcb0aeb49344472ce9d44271",
                "tx_type": "token_transfer",
                "tx_status": "success",
                "nonce": 5,
                "fee_rate": "1000",
                "sender_address": "ST1THWXQ8368SDN2MJGE4BMDKMCHZ2GSVTSQDA7QF",
                "block_height": 12345,
                "burn_block_time_iso": "2024-01-01T00:00:00.000Z",
                "token_transfer": {
                    "recipient_address": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
                    "amount": "100000000",
                    "memo": "0x00"
                },
                "events": []
            },
            {
                "tx_id": "0xabc",
                "tx_type": "contract_call",
                "tx_status": "abort_by_response"
            }
        ]
    }"#;

    #[test]
    fn test_parse_history_page() {
        let page = parse_history(PAGE).unwrap();
        assert_eq!((page.limit, page.offset, page.total), (2, 0, 3));
        assert_eq!(page.results.len(), 2);

        let transfer = &page.results[0];
        assert_eq!(transfer.nonce, Some(5));
        assert_eq!(
            transfer.token_transfer.as_ref().unwrap().amount,
            "100000000"
        );
        assert!(transfer.raw.get("events").is_some());

        let call = &page.results[1];
        assert_eq!(call.tx_type, "contract_call");
        assert!(call.token_transfer.is_none());
    }

    #[test]
    fn test_entry_missing_required_fields() {
        let body = r#"{"limit":1,"offset":0,"total":1,"results":[{"tx_type":"coinbase"}]}"#;
        assert!(parse_history(body).is_err());
    }
}

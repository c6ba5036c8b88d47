//! Account balance and nonce lookups

use super::{checked_address, decode_json, NodeClient};
use crate::error::StxResult;
use crate::utils::logging::redact_address;
use crate::wallet::{format_stx, parse_micro_stx};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balance: String,
    #[serde(default)]
    locked: Option<String>,
    nonce: u64,
}

/// Account state as reported by `/v2/accounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance_micro_stx: u128,
    pub locked_micro_stx: u128,
    /// Next nonce the chain expects from this account
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub micro_stx: u128,
    /// Exact decimal STX rendering
    pub stx: String,
}

impl From<u128> for Balance {
    fn from(micro_stx: u128) -> Self {
        Self {
            micro_stx,
            stx: format_stx(micro_stx),
        }
    }
}

/// Decode a `/v2/accounts` body
pub fn parse_account(body: &str) -> StxResult<AccountInfo> {
    let raw: AccountResponse = decode_json(body)?;
    Ok(AccountInfo {
        balance_micro_stx: parse_micro_stx(&raw.balance)?,
        locked_micro_stx: match raw.locked.as_deref() {
            Some(locked) => parse_micro_stx(locked)?,
            None => 0,
        },
        nonce: raw.nonce,
    })
}

impl NodeClient {
    pub async fn fetch_account(&self, address: &str) -> StxResult<AccountInfo> {
        let address = checked_address(address)?;
        let body = self
            .get_text(&format!("/v2/accounts/{}?proof=0", address))
            .await?;
        let account = parse_account(&body)?;

        tracing::debug!(
            address = %redact_address(&address),
            nonce = account.nonce,
            "account fetched"
        );
        Ok(account)
    }

    pub async fn fetch_balance(&self, address: &str) -> StxResult<Balance> {
        Ok(self.fetch_account(address).await?.balance_micro_stx.into())
    }
}

//! Shared types for STX custody transfers
//!
//! Data structures that cross module boundaries are defined here
//! for consistent serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Network
// =============================================================================

/// Stacks network a transaction is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    /// Transaction version byte
    pub fn transaction_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x80,
        }
    }

    pub fn chain_id(&self) -> u32 {
        match self {
            Network::Mainnet => 0x0000_0001,
            Network::Testnet => 0x8000_0000,
        }
    }

    /// c32 address version for single-signature (P2PKH) accounts
    pub fn single_sig_address_version(&self) -> u8 {
        match self {
            Network::Mainnet => 22,
            Network::Testnet => 26,
        }
    }

    /// c32 address version for multi-signature (P2SH) accounts
    pub fn multi_sig_address_version(&self) -> u8 {
        match self {
            Network::Mainnet => 20,
            Network::Testnet => 21,
        }
    }

    /// Network an address version byte belongs to, if it is a known one
    pub fn from_address_version(version: u8) -> Option<Network> {
        match version {
            22 | 20 => Some(Network::Mainnet),
            26 | 21 => Some(Network::Testnet),
            _ => None,
        }
    }

    pub fn from_transaction_version(version: u8) -> Option<Network> {
        match version {
            0x00 => Some(Network::Mainnet),
            0x80 => Some(Network::Testnet),
            _ => None,
        }
    }

    pub fn explorer_tx_url(&self, txid: &str) -> String {
        let txid = if txid.starts_with("0x") {
            txid.to_string()
        } else {
            format!("0x{}", txid)
        };
        match self {
            Network::Mainnet => format!("https://explorer.hiro.so/txid/{}?chain=mainnet", txid),
            Network::Testnet => format!("https://explorer.hiro.so/txid/{}?chain=testnet", txid),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

// =============================================================================
// Hashes
// =============================================================================

/// 32-byte hash value (sig-hashes, digests, txids)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `0x`-prefixed hex, the form signers expect
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut out)?;
        Ok(Self(out))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Transfer Intent
// =============================================================================

/// Maximum memo length carried by a token transfer payload
pub const MAX_MEMO_BYTES: usize = 34;

/// A request to move STX from a custodied account to a recipient.
///
/// Built once and passed by reference; validation happens when the
/// transaction is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Hex secp256k1 public key of the sender (33 or 65 bytes)
    pub sender_public_key: String,
    /// Account identifier handed to the signer; the public key when absent
    pub signer_account: Option<String>,
    /// Recipient principal (`SP…`, `ST…` or `SP….contract-name`)
    pub recipient: String,
    pub amount_micro_stx: u64,
    /// Fee in µSTX; the transfer policy default when absent
    pub fee_micro_stx: Option<u64>,
    /// Sender nonce; 0 when absent
    pub nonce: Option<u64>,
    #[serde(default)]
    pub memo: Vec<u8>,
    #[serde(default)]
    pub network: Network,
}

impl TransferIntent {
    pub fn new(
        sender_public_key: impl Into<String>,
        recipient: impl Into<String>,
        amount_micro_stx: u64,
        network: Network,
    ) -> Self {
        Self {
            sender_public_key: sender_public_key.into(),
            signer_account: None,
            recipient: recipient.into(),
            amount_micro_stx,
            fee_micro_stx: None,
            nonce: None,
            memo: Vec::new(),
            network,
        }
    }

    pub fn with_fee(mut self, fee_micro_stx: u64) -> Self {
        self.fee_micro_stx = Some(fee_micro_stx);
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_memo(mut self, memo: impl Into<Vec<u8>>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_signer_account(mut self, account: impl Into<String>) -> Self {
        self.signer_account = Some(account.into());
        self
    }

    /// Identifier the signer is asked to sign with
    pub fn signer_account(&self) -> &str {
        self.signer_account
            .as_deref()
            .unwrap_or(&self.sender_public_key)
    }
}

// =============================================================================
// Broadcast Results
// =============================================================================

/// Node acknowledgement of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReceipt {
    /// Transaction id as reported by the node, `0x`-prefixed
    pub txid: String,
    /// Transaction id computed locally from the signed bytes
    pub local_txid: String,
    pub explorer_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_constants() {
        assert_eq!(Network::Testnet.transaction_version(), 0x80);
        assert_eq!(Network::Mainnet.transaction_version(), 0x00);
        assert_eq!(Network::Testnet.chain_id(), 0x8000_0000);
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::from_address_version(22), Some(Network::Mainnet));
        assert_eq!(Network::from_address_version(26), Some(Network::Testnet));
        assert_eq!(Network::from_address_version(7), None);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = Hash256([0xab; 32]);
        assert_eq!(h.to_prefixed_hex().len(), 66);
        assert_eq!(Hash256::from_hex(&h.to_prefixed_hex()).unwrap(), h);
        assert!(Hash256::from_hex("abcd").is_err());
    }

    #[test]
    fn test_intent_signer_account_defaults_to_public_key() {
        let intent = TransferIntent::new("02aa", "ST000000000000000000002AMW42H", 1, Network::Testnet);
        assert_eq!(intent.signer_account(), "02aa");

        let intent = intent.with_signer_account("key-id-1");
        assert_eq!(intent.signer_account(), "key-id-1");
    }
}

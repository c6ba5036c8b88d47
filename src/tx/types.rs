//! Wire model for a single-signature STX token transfer

use crate::error::{StxError, StxResult};
use crate::types::{Hash256, Network, MAX_MEMO_BYTES};
use crate::wallet::Principal;
use std::fmt;

/// Length of a recoverable secp256k1 signature on the wire (v ‖ r ‖ s)
pub const MESSAGE_SIGNATURE_LEN: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthType {
    Standard = 0x04,
    Sponsored = 0x05,
}

impl AuthType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x04 => Some(AuthType::Standard),
            0x05 => Some(AuthType::Sponsored),
            _ => None,
        }
    }
}

/// How the signer hash of a spending condition is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HashMode {
    P2pkh = 0x00,
    P2sh = 0x01,
    P2wpkh = 0x02,
    P2wsh = 0x03,
}

impl HashMode {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(HashMode::P2pkh),
            0x01 => Some(HashMode::P2sh),
            0x02 => Some(HashMode::P2wpkh),
            0x03 => Some(HashMode::P2wsh),
            _ => None,
        }
    }

    pub fn is_single_sig(&self) -> bool {
        matches!(self, HashMode::P2pkh | HashMode::P2wpkh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyEncoding {
    Compressed = 0x00,
    Uncompressed = 0x01,
}

impl KeyEncoding {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(KeyEncoding::Compressed),
            0x01 => Some(KeyEncoding::Uncompressed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnchorMode {
    OnChainOnly = 0x01,
    OffChainOnly = 0x02,
    Any = 0x03,
}

impl AnchorMode {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(AnchorMode::OnChainOnly),
            0x02 => Some(AnchorMode::OffChainOnly),
            0x03 => Some(AnchorMode::Any),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PostConditionMode {
    Allow = 0x01,
    Deny = 0x02,
}

impl PostConditionMode {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(PostConditionMode::Allow),
            0x02 => Some(PostConditionMode::Deny),
            _ => None,
        }
    }
}

/// 65-byte recoverable signature slot, recovery byte first
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageSignature(pub [u8; MESSAGE_SIGNATURE_LEN]);

impl MessageSignature {
    pub const EMPTY: MessageSignature = MessageSignature([0u8; MESSAGE_SIGNATURE_LEN]);

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[0]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for MessageSignature {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("MessageSignature(empty)")
        } else {
            write!(f, "MessageSignature({})", self.to_hex())
        }
    }
}

/// Spending condition controlled by a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSigSpendingCondition {
    pub hash_mode: HashMode,
    /// hash160 of the signer's public key
    pub signer: [u8; 20],
    pub nonce: u64,
    pub fee: u64,
    pub key_encoding: KeyEncoding,
    pub signature: MessageSignature,
}

/// Multi-signature spending condition header.
///
/// Only carried so that such transactions can be represented and refused;
/// the signature fields are always empty here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSigSpendingCondition {
    pub hash_mode: HashMode,
    pub signer: [u8; 20],
    pub nonce: u64,
    pub fee: u64,
    pub signatures_required: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendingCondition {
    SingleSig(SingleSigSpendingCondition),
    MultiSig(MultiSigSpendingCondition),
}

impl SpendingCondition {
    pub fn nonce(&self) -> u64 {
        match self {
            SpendingCondition::SingleSig(c) => c.nonce,
            SpendingCondition::MultiSig(c) => c.nonce,
        }
    }

    pub fn fee(&self) -> u64 {
        match self {
            SpendingCondition::SingleSig(c) => c.fee,
            SpendingCondition::MultiSig(c) => c.fee,
        }
    }

    pub fn hash_mode(&self) -> HashMode {
        match self {
            SpendingCondition::SingleSig(c) => c.hash_mode,
            SpendingCondition::MultiSig(c) => c.hash_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionAuth {
    Standard(SpendingCondition),
    Sponsored(SpendingCondition, SpendingCondition),
}

impl TransactionAuth {
    pub fn auth_type(&self) -> AuthType {
        match self {
            TransactionAuth::Standard(_) => AuthType::Standard,
            TransactionAuth::Sponsored(_, _) => AuthType::Sponsored,
        }
    }

    pub fn origin(&self) -> &SpendingCondition {
        match self {
            TransactionAuth::Standard(origin) | TransactionAuth::Sponsored(origin, _) => origin,
        }
    }

    /// The origin condition, provided this is standard single-signature auth
    pub fn single_sig(&self) -> StxResult<&SingleSigSpendingCondition> {
        match self {
            TransactionAuth::Standard(SpendingCondition::SingleSig(c)) => Ok(c),
            TransactionAuth::Standard(SpendingCondition::MultiSig(c)) => Err(
                StxError::UnsupportedAuthKind(format!("multi-signature ({:?})", c.hash_mode)),
            ),
            TransactionAuth::Sponsored(_, _) => {
                Err(StxError::UnsupportedAuthKind("sponsored".to_string()))
            }
        }
    }

    pub(crate) fn single_sig_mut(&mut self) -> StxResult<&mut SingleSigSpendingCondition> {
        match self {
            TransactionAuth::Standard(SpendingCondition::SingleSig(c)) => Ok(c),
            TransactionAuth::Standard(SpendingCondition::MultiSig(_)) => Err(
                StxError::AuthStructureMismatch("spending condition is multi-signature".into()),
            ),
            TransactionAuth::Sponsored(_, _) => Err(StxError::AuthStructureMismatch(
                "authorization is sponsored".into(),
            )),
        }
    }
}

/// STX token transfer payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransferPayload {
    pub recipient: Principal,
    pub amount: u64,
    pub memo: [u8; MAX_MEMO_BYTES],
}

/// A token transfer transaction in wire order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StacksTransaction {
    pub network: Network,
    pub chain_id: u32,
    pub auth: TransactionAuth,
    pub anchor_mode: AnchorMode,
    pub post_condition_mode: PostConditionMode,
    pub payload: TokenTransferPayload,
}

// =============================================================================
// Lifecycle wrappers
// =============================================================================

/// A transfer whose signature slot is still empty.
///
/// Only the assembler creates these, and attaching a signature consumes the
/// value, so one unsigned transaction can feed exactly one signed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction(pub(crate) StacksTransaction);

impl UnsignedTransaction {
    pub fn transaction(&self) -> &StacksTransaction {
        &self.0
    }

    pub fn fee(&self) -> u64 {
        self.0.auth.origin().fee()
    }

    pub fn nonce(&self) -> u64 {
        self.0.auth.origin().nonce()
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.0.serialize()
    }
}

/// A transfer carrying a signature; the only value eligible for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction(pub(crate) StacksTransaction);

impl SignedTransaction {
    /// Parse signed wire bytes received from elsewhere
    pub fn from_bytes(bytes: &[u8]) -> StxResult<Self> {
        let tx = StacksTransaction::from_bytes(bytes)?;
        if tx.auth.single_sig()?.signature.is_empty() {
            return Err(StxError::codec("Transaction carries no signature"));
        }
        Ok(Self(tx))
    }

    pub fn transaction(&self) -> &StacksTransaction {
        &self.0
    }

    pub fn into_inner(self) -> StacksTransaction {
        self.0
    }

    pub fn fee(&self) -> u64 {
        self.0.auth.origin().fee()
    }

    pub fn nonce(&self) -> u64 {
        self.0.auth.origin().nonce()
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.0.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    pub fn txid(&self) -> Hash256 {
        self.0.txid()
    }
}

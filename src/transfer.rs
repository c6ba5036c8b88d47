//! Transfer Pipeline
//!
//! Wires the stages of a custodial transfer together:
//! intent → unsigned transaction → pre-sign digest → external signature →
//! normalized signature → signed transaction → broadcast.
//!
//! Each stage's error is returned unchanged. The pipeline holds no state
//! between calls, so concurrent transfers only share the signer and the
//! broadcaster. Nonce uniqueness per sender is the caller's job (see
//! [`crate::wallet::NonceAllocator`]).

use crate::error::StxResult;
use crate::signer::{SignRequest, TransactionSigner};
use crate::signing::{normalize, pre_sign_digest, verify_signature, DigestAlgorithm, PreSignDigest};
use crate::tx::{
    attach_signature, build_unsigned_with_default_fee, Broadcaster, SignedTransaction,
    UnsignedTransaction, DEFAULT_FEE_MICRO_STX,
};
use crate::types::{BroadcastReceipt, TransferIntent};
use crate::utils::logging::{redact_address, redact_hash};
use serde::{Deserialize, Serialize};

/// Choices the pipeline makes on the caller's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPolicy {
    /// Fee (µSTX) for intents that carry none
    pub default_fee: u64,
    pub digest_algorithm: DigestAlgorithm,
    /// Recover the signing key locally before broadcasting
    pub verify_before_broadcast: bool,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            default_fee: DEFAULT_FEE_MICRO_STX,
            digest_algorithm: DigestAlgorithm::default(),
            verify_before_broadcast: true,
        }
    }
}

/// An unsigned transaction paired with the digest computed from it
#[derive(Debug, Clone)]
pub struct PreparedTransfer {
    unsigned: UnsignedTransaction,
    digest: PreSignDigest,
    signer_account: String,
}

impl PreparedTransfer {
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn digest(&self) -> &PreSignDigest {
        &self.digest
    }

    pub fn signer_account(&self) -> &str {
        &self.signer_account
    }

    /// The request the signer will receive
    pub fn sign_request(&self) -> SignRequest {
        SignRequest::new(&self.digest.digest, self.signer_account.clone())
    }
}

pub struct TransferPipeline<S> {
    signer: S,
    broadcaster: Broadcaster,
    policy: TransferPolicy,
}

impl<S: TransactionSigner> TransferPipeline<S> {
    pub fn new(signer: S, broadcaster: Broadcaster, policy: TransferPolicy) -> Self {
        Self {
            signer,
            broadcaster,
            policy,
        }
    }

    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }

    /// Build the unsigned transaction and its digest
    pub fn prepare(&self, intent: &TransferIntent) -> StxResult<PreparedTransfer> {
        let unsigned = build_unsigned_with_default_fee(intent, self.policy.default_fee)?;
        let digest = pre_sign_digest(unsigned.transaction(), self.policy.digest_algorithm)?;

        tracing::debug!(
            digest = %redact_hash(&digest.digest.to_hex()),
            fee = digest.fee,
            nonce = digest.nonce,
            algorithm = ?digest.algorithm,
            "pre-sign digest computed"
        );

        Ok(PreparedTransfer {
            unsigned,
            digest,
            signer_account: intent.signer_account().to_string(),
        })
    }

    /// Obtain a signature for a prepared transfer and attach it
    pub async fn sign(&self, prepared: PreparedTransfer) -> StxResult<SignedTransaction> {
        let request = prepared.sign_request();
        tracing::debug!(
            account = %redact_address(&prepared.signer_account),
            "requesting signature"
        );

        let components = self.signer.sign(&request).await?;
        let compact = normalize(&components)?;
        let signed = attach_signature(prepared.unsigned, &compact)?;

        if self.policy.verify_before_broadcast {
            verify_signature(&signed, self.policy.digest_algorithm)?;
        }
        Ok(signed)
    }

    pub async fn submit(&self, signed: &SignedTransaction) -> StxResult<BroadcastReceipt> {
        self.broadcaster.broadcast(signed).await
    }

    /// Prepare, sign and broadcast in one call
    pub async fn send(&self, intent: &TransferIntent) -> StxResult<BroadcastReceipt> {
        let prepared = self.prepare(intent)?;
        let signed = self.sign(prepared).await?;
        self.submit(&signed).await
    }
}

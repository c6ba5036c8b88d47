//! Pre-Sign Digest Generation
//!
//! Computes the hash an external signer must sign for a token transfer.
//! Everything here is pure: no I/O, no shared state.

use crate::error::StxResult;
use crate::tx::{
    AuthType, MessageSignature, SpendingCondition, StacksTransaction, TransactionAuth,
};
use crate::types::Hash256;
use crate::utils::crypto::{sha256, sha512_256};
use serde::{Deserialize, Serialize};

/// Hash applied to `base ‖ auth flag ‖ fee ‖ nonce`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    /// Single SHA-256 pass
    #[default]
    Sha256,
    /// SHA-512/256, as computed by stacks-core's verifier
    Sha512_256,
}

impl DigestAlgorithm {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        match self {
            DigestAlgorithm::Sha256 => sha256(data),
            DigestAlgorithm::Sha512_256 => sha512_256(data),
        }
    }
}

/// A digest together with the values bound into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSignDigest {
    /// The hash to sign (32 bytes)
    pub digest: Hash256,
    pub base_sig_hash: Hash256,
    pub auth_flag: u8,
    pub fee: u64,
    pub nonce: u64,
    pub algorithm: DigestAlgorithm,
}

impl PreSignDigest {
    /// Get digest as `0x`-prefixed hex, the form sent to signers
    pub fn digest_hex(&self) -> String {
        self.digest.to_prefixed_hex()
    }

    /// Whether `tx` still carries the fee and nonce this digest was made for
    pub fn matches(&self, tx: &StacksTransaction) -> bool {
        let origin = tx.auth.origin();
        origin.fee() == self.fee
            && origin.nonce() == self.nonce
            && tx.auth.auth_type() as u8 == self.auth_flag
    }
}

/// SHA-512/256 of the transaction with fee, nonce and signature cleared.
///
/// Fails with `UnsupportedAuthKind` unless the transaction uses standard
/// single-signature spending.
pub fn compute_base_sig_hash(tx: &StacksTransaction) -> StxResult<Hash256> {
    let condition = tx.auth.single_sig()?;

    let mut cleared_condition = condition.clone();
    cleared_condition.fee = 0;
    cleared_condition.nonce = 0;
    cleared_condition.signature = MessageSignature::EMPTY;

    let mut cleared = tx.clone();
    cleared.auth = TransactionAuth::Standard(SpendingCondition::SingleSig(cleared_condition));

    Ok(Hash256(sha512_256(&cleared.serialize())))
}

/// SHA-256 over `base_sig_hash ‖ auth_flag ‖ fee (BE) ‖ nonce (BE)`
pub fn compute_pre_sign_digest(
    base_sig_hash: &Hash256,
    auth_flag: u8,
    fee: u64,
    nonce: u64,
) -> Hash256 {
    compute_pre_sign_digest_with(DigestAlgorithm::Sha256, base_sig_hash, auth_flag, fee, nonce)
}

pub fn compute_pre_sign_digest_with(
    algorithm: DigestAlgorithm,
    base_sig_hash: &Hash256,
    auth_flag: u8,
    fee: u64,
    nonce: u64,
) -> Hash256 {
    let mut buf = [0u8; 49];
    buf[..32].copy_from_slice(base_sig_hash.as_bytes());
    buf[32] = auth_flag;
    buf[33..41].copy_from_slice(&fee.to_be_bytes());
    buf[41..49].copy_from_slice(&nonce.to_be_bytes());
    Hash256(algorithm.hash(&buf))
}

/// Both hashes for `tx`, reading fee and nonce from its spending condition
pub fn pre_sign_digest(
    tx: &StacksTransaction,
    algorithm: DigestAlgorithm,
) -> StxResult<PreSignDigest> {
    let base_sig_hash = compute_base_sig_hash(tx)?;
    let condition = tx.auth.single_sig()?;
    let auth_flag = AuthType::Standard as u8;

    let digest = compute_pre_sign_digest_with(
        algorithm,
        &base_sig_hash,
        auth_flag,
        condition.fee,
        condition.nonce,
    );

    Ok(PreSignDigest {
        digest,
        base_sig_hash,
        auth_flag,
        fee: condition.fee,
        nonce: condition.nonce,
        algorithm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StxError;
    use crate::tx::{build_unsigned, HashMode, MultiSigSpendingCondition};
    use crate::types::{Network, TransferIntent};

    fn scenario_tx() -> StacksTransaction {
        let intent = TransferIntent::new(
            "0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798",
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            100_000_000,
            Network::Testnet,
        )
        .with_fee(1000)
        .with_nonce(5);
        build_unsigned(&intent).unwrap().transaction().clone()
    }

    #[test]
    fn test_known_base_sig_hash() {
        assert_eq!(
            compute_base_sig_hash(&scenario_tx()).unwrap().to_hex(),
            "123f4cf7b335bba7f42e5f3e3f48502c6936bb105b7bae5f8ad79b239297571c"
        );
    }

    #[test]
    fn test_known_pre_sign_digests() {
        let tx = scenario_tx();
        let plain = pre_sign_digest(&tx, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(
            plain.digest.to_hex(),
            "c131846b67d1b94ed3c8cfc744e2b997f95ca22f0e062f96fee47b1ecc469662"
        );
        assert_eq!(plain.auth_flag, 0x04);
        assert_eq!((plain.fee, plain.nonce), (1000, 5));

        let wide = pre_sign_digest(&tx, DigestAlgorithm::Sha512_256).unwrap();
        assert_eq!(
            wide.digest.to_hex(),
            "5973019c1e0bd9ccad5e1d73a6bd76407a1cf15e10a691b98a608fd4960b302c"
        );
        assert_eq!(wide.base_sig_hash, plain.base_sig_hash);
    }

    #[test]
    fn test_digest_buffer_layout() {
        let digest = compute_pre_sign_digest(&Hash256([0u8; 32]), 0x04, 0, 0);
        assert_eq!(
            digest.to_hex(),
            "152688730abb7d784e0c76826278f5461c8dfb00583097bc31b3946162cbe5fa"
        );
    }

    #[test]
    fn test_base_hash_ignores_fee_and_nonce() {
        let tx = scenario_tx();
        let mut bumped = tx.clone();
        if let TransactionAuth::Standard(SpendingCondition::SingleSig(c)) = &mut bumped.auth {
            c.fee = 99_999;
            c.nonce = 42;
        }
        assert_eq!(
            compute_base_sig_hash(&tx).unwrap(),
            compute_base_sig_hash(&bumped).unwrap()
        );
        assert_ne!(
            pre_sign_digest(&tx, DigestAlgorithm::Sha256).unwrap().digest,
            pre_sign_digest(&bumped, DigestAlgorithm::Sha256).unwrap().digest
        );
    }

    #[test]
    fn test_digest_matches_transaction() {
        let tx = scenario_tx();
        let digest = pre_sign_digest(&tx, DigestAlgorithm::Sha256).unwrap();
        assert!(digest.matches(&tx));

        let mut other = tx.clone();
        if let TransactionAuth::Standard(SpendingCondition::SingleSig(c)) = &mut other.auth {
            c.nonce = 6;
        }
        assert!(!digest.matches(&other));
    }

    #[test]
    fn test_multisig_unsupported() {
        let mut tx = scenario_tx();
        tx.auth = TransactionAuth::Standard(SpendingCondition::MultiSig(
            MultiSigSpendingCondition {
                hash_mode: HashMode::P2sh,
                signer: [0u8; 20],
                nonce: 0,
                fee: 0,
                signatures_required: 2,
            },
        ));
        assert!(matches!(
            compute_base_sig_hash(&tx),
            Err(StxError::UnsupportedAuthKind(_))
        ));
        assert!(matches!(
            pre_sign_digest(&tx, DigestAlgorithm::Sha256),
            Err(StxError::UnsupportedAuthKind(_))
        ));
    }
}

//! Transaction Builder
//!
//! Turns a transfer intent into an unsigned token transfer, and later
//! splices a normalized signature into it.

use super::types::*;
use crate::error::{StxError, StxResult};
use crate::signing::CompactSignature;
use crate::types::{TransferIntent, MAX_MEMO_BYTES};
use crate::utils::logging::{redact_address, redact_hash};
use crate::utils::crypto::hash160;
use crate::wallet::Principal;

/// Fee used when neither the intent nor the policy names one (µSTX)
pub const DEFAULT_FEE_MICRO_STX: u64 = 5_000;

/// Build an unsigned transfer, using [`DEFAULT_FEE_MICRO_STX`] when the
/// intent carries no fee
pub fn build_unsigned(intent: &TransferIntent) -> StxResult<UnsignedTransaction> {
    build_unsigned_with_default_fee(intent, DEFAULT_FEE_MICRO_STX)
}

/// Build an unsigned transfer with an explicit fallback fee.
///
/// All validation happens before anything is constructed.
pub fn build_unsigned_with_default_fee(
    intent: &TransferIntent,
    default_fee: u64,
) -> StxResult<UnsignedTransaction> {
    if intent.amount_micro_stx == 0 {
        return Err(StxError::invalid_intent("amount", "Amount must be greater than zero"));
    }

    if intent.memo.len() > MAX_MEMO_BYTES {
        return Err(StxError::invalid_intent(
            "memo",
            format!("Memo is {} bytes (max {})", intent.memo.len(), MAX_MEMO_BYTES),
        ));
    }

    let (signer, key_encoding) = signer_hash(&intent.sender_public_key)?;

    let recipient = Principal::parse(&intent.recipient)
        .map_err(|e| StxError::invalid_intent("recipient", e.to_string()))?;
    if recipient.address().network() != Some(intent.network) {
        tracing::warn!(
            recipient = %redact_address(&intent.recipient),
            network = %intent.network,
            "recipient address version does not match transfer network"
        );
    }

    let mut memo = [0u8; MAX_MEMO_BYTES];
    memo[..intent.memo.len()].copy_from_slice(&intent.memo);

    let nonce = intent.nonce.unwrap_or(0);
    let fee = intent.fee_micro_stx.unwrap_or(default_fee);

    let tx = StacksTransaction {
        network: intent.network,
        chain_id: intent.network.chain_id(),
        auth: TransactionAuth::Standard(SpendingCondition::SingleSig(
            SingleSigSpendingCondition {
                hash_mode: HashMode::P2pkh,
                signer,
                nonce,
                fee,
                key_encoding,
                signature: MessageSignature::EMPTY,
            },
        )),
        anchor_mode: AnchorMode::Any,
        post_condition_mode: PostConditionMode::Deny,
        payload: TokenTransferPayload {
            recipient,
            amount: intent.amount_micro_stx,
            memo,
        },
    };

    tracing::debug!(
        sender = %redact_address(&intent.sender_public_key),
        recipient = %redact_address(&intent.recipient),
        amount = intent.amount_micro_stx,
        fee,
        nonce,
        network = %intent.network,
        "unsigned transfer built"
    );

    Ok(UnsignedTransaction(tx))
}

/// hash160 and encoding of a hex secp256k1 public key
fn signer_hash(public_key_hex: &str) -> StxResult<([u8; 20], KeyEncoding)> {
    let bytes = hex::decode(public_key_hex.trim().trim_start_matches("0x")).map_err(|e| {
        StxError::invalid_intent("sender_public_key", format!("Invalid hex: {}", e))
    })?;

    let key_encoding = match bytes.len() {
        33 => KeyEncoding::Compressed,
        65 => KeyEncoding::Uncompressed,
        n => {
            return Err(StxError::invalid_intent(
                "sender_public_key",
                format!("Public key must be 33 or 65 bytes, got {}", n),
            ))
        }
    };

    secp256k1::PublicKey::from_slice(&bytes).map_err(|e| {
        StxError::invalid_intent("sender_public_key", format!("Not a secp256k1 point: {}", e))
    })?;

    Ok((hash160(&bytes), key_encoding))
}

/// Write `signature` into the spending condition, consuming the unsigned value
pub fn attach_signature(
    tx: UnsignedTransaction,
    signature: &CompactSignature,
) -> StxResult<SignedTransaction> {
    let mut inner = tx.0;
    let condition = inner.auth.single_sig_mut()?;
    condition.signature = MessageSignature(*signature.as_bytes());

    let signed = SignedTransaction(inner);
    tracing::debug!(
        local_txid = %redact_hash(&signed.txid().to_hex()),
        "signature attached"
    );
    Ok(signed)
}

/// Canonical wire bytes of a signed transfer
pub fn serialize(tx: &SignedTransaction) -> Vec<u8> {
    tx.serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Network;

    const SENDER_PK: &str =
        "0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";
    const RECIPIENT: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";

    fn intent() -> TransferIntent {
        TransferIntent::new(SENDER_PK, RECIPIENT, 100_000_000, Network::Testnet)
            .with_fee(1000)
            .with_nonce(5)
    }

    fn stub_signature() -> CompactSignature {
        let hex = format!("01{}{}", "11".repeat(32), "22".repeat(32));
        CompactSignature::from_hex(&hex).unwrap()
    }

    #[test]
    fn test_build_sets_auth_fields() {
        let tx = build_unsigned(&intent()).unwrap();
        let inner = tx.transaction();
        assert_eq!(inner.auth.auth_type(), AuthType::Standard);
        let condition = inner.auth.single_sig().unwrap();
        assert_eq!(condition.fee, 1000);
        assert_eq!(condition.nonce, 5);
        assert!(condition.signature.is_empty());
        assert_eq!(
            hex::encode(condition.signer),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_defaults_for_fee_and_nonce() {
        let bare = TransferIntent::new(SENDER_PK, RECIPIENT, 1, Network::Testnet);
        let tx = build_unsigned(&bare).unwrap();
        assert_eq!(tx.fee(), DEFAULT_FEE_MICRO_STX);
        assert_eq!(tx.nonce(), 0);

        let tx = build_unsigned_with_default_fee(&bare, 180).unwrap();
        assert_eq!(tx.fee(), 180);
    }

    #[test]
    fn test_memo_boundary() {
        assert!(build_unsigned(&intent().with_memo(vec![b'a'; 34])).is_ok());

        let err = build_unsigned(&intent().with_memo(vec![b'a'; 35])).unwrap_err();
        assert!(matches!(err, StxError::InvalidIntent { field: "memo", .. }));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut zero = intent();
        zero.amount_micro_stx = 0;
        let err = build_unsigned(&zero).unwrap_err();
        assert!(matches!(err, StxError::InvalidIntent { field: "amount", .. }));
    }

    #[test]
    fn test_bad_keys_and_recipients_rejected() {
        let mut bad = intent();
        bad.sender_public_key = "02abcd".into();
        assert!(matches!(
            build_unsigned(&bad),
            Err(StxError::InvalidIntent { field: "sender_public_key", .. })
        ));

        // 33 bytes but not on the curve
        bad.sender_public_key = format!("05{}", "11".repeat(32));
        assert!(matches!(
            build_unsigned(&bad),
            Err(StxError::InvalidIntent { field: "sender_public_key", .. })
        ));

        let mut bad = intent();
        bad.recipient = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ8".into();
        assert!(matches!(
            build_unsigned(&bad),
            Err(StxError::InvalidIntent { field: "recipient", .. })
        ));
    }

    #[test]
    fn test_attach_places_vrs_in_auth_slot() {
        let tx = build_unsigned(&intent()).unwrap();
        let signed = attach_signature(tx, &stub_signature()).unwrap();
        let bytes = serialize(&signed);

        let expected = format!("01{}{}", "11".repeat(32), "22".repeat(32));
        assert_eq!(hex::encode(&bytes[44..109]), expected);
        assert_eq!(signed.fee(), 1000);
        assert_eq!(signed.nonce(), 5);
        assert_eq!(
            signed.txid().to_hex(),
            "7fdf10363909633d006fc8ce494a11748967df2ddcb0aeb49344472ce9d44271"
        );
    }

    #[test]
    fn test_attach_refuses_multisig() {
        let mut tx = build_unsigned(&intent()).unwrap();
        tx.0.auth = TransactionAuth::Standard(SpendingCondition::MultiSig(
            MultiSigSpendingCondition {
                hash_mode: HashMode::P2sh,
                signer: [0u8; 20],
                nonce: 5,
                fee: 1000,
                signatures_required: 2,
            },
        ));
        assert!(matches!(
            attach_signature(tx, &stub_signature()),
            Err(StxError::AuthStructureMismatch(_))
        ));
    }

    #[test]
    fn test_uncompressed_sender_key() {
        use crate::signing::{
            normalize, pre_sign_digest, recover_signer_public_key, verify_signature,
            DigestAlgorithm, SignatureComponents,
        };
        use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

        let secp = Secp256k1::new();
        let mut one = [0u8; 32];
        one[31] = 1;
        let secret = SecretKey::from_slice(&one).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret).serialize_uncompressed();

        let mut uncompressed = intent();
        uncompressed.sender_public_key = hex::encode(public);
        let tx = build_unsigned(&uncompressed).unwrap();
        let condition = tx.transaction().auth.single_sig().unwrap();
        assert_eq!(condition.key_encoding, KeyEncoding::Uncompressed);
        // hash160 covers the 65-byte form, not the compressed one
        assert_eq!(condition.signer, hash160(&public));
        assert_ne!(
            hex::encode(condition.signer),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );

        let digest = pre_sign_digest(tx.transaction(), DigestAlgorithm::Sha256).unwrap();
        let (recid, bytes) = secp
            .sign_ecdsa_recoverable(&Message::from_digest(*digest.digest.as_bytes()), &secret)
            .serialize_compact();
        let compact = normalize(&SignatureComponents::split(
            recid.to_i32() as u64,
            hex::encode(&bytes[..32]),
            hex::encode(&bytes[32..]),
        ))
        .unwrap();
        let signed = attach_signature(tx, &compact).unwrap();

        let wire = serialize(&signed);
        assert_eq!(wire.len(), 180);
        assert_eq!(wire[43], 0x01);

        let parsed = SignedTransaction::from_bytes(&wire).unwrap();
        assert_eq!(parsed, signed);
        assert!(verify_signature(&parsed, DigestAlgorithm::Sha256).is_ok());
        assert_eq!(
            recover_signer_public_key(&parsed, DigestAlgorithm::Sha256).unwrap(),
            public.to_vec()
        );
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let a = attach_signature(build_unsigned(&intent()).unwrap(), &stub_signature()).unwrap();
        let b = attach_signature(build_unsigned(&intent()).unwrap(), &stub_signature()).unwrap();
        assert_eq!(serialize(&a), serialize(&b));
    }
}

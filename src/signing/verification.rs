//! Signature Verification
//!
//! Recovers the signing key from a signed transfer and checks it against the
//! spending condition, so a bad signature is caught before the node sees it.

use super::preimage::{pre_sign_digest, DigestAlgorithm};
use crate::error::{StxError, StxResult};
use crate::tx::{KeyEncoding, SignedTransaction};
use crate::utils::crypto::hash160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};

/// Public key that produced the attached signature, serialized in the
/// spending condition's key encoding
pub fn recover_signer_public_key(
    tx: &SignedTransaction,
    algorithm: DigestAlgorithm,
) -> StxResult<Vec<u8>> {
    let condition = tx.transaction().auth.single_sig()?;
    let digest = pre_sign_digest(tx.transaction(), algorithm)?;
    let signature = &condition.signature.0;

    let recovery_id = RecoveryId::from_i32(signature[0] as i32)
        .map_err(|e| StxError::malformed_signature(format!("Recovery id: {}", e)))?;
    let recoverable = RecoverableSignature::from_compact(&signature[1..], recovery_id)
        .map_err(|e| StxError::malformed_signature(format!("Signature scalars: {}", e)))?;

    let message = Message::from_digest(*digest.digest.as_bytes());
    let public_key: PublicKey = Secp256k1::verification_only()
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| StxError::malformed_signature(format!("Key recovery failed: {}", e)))?;

    Ok(match condition.key_encoding {
        KeyEncoding::Compressed => public_key.serialize().to_vec(),
        KeyEncoding::Uncompressed => public_key.serialize_uncompressed().to_vec(),
    })
}

/// Check that the attached signature was made by the spending condition's key
pub fn verify_signature(tx: &SignedTransaction, algorithm: DigestAlgorithm) -> StxResult<()> {
    let expected = tx.transaction().auth.single_sig()?.signer;
    let recovered = recover_signer_public_key(tx, algorithm)?;

    if hash160(&recovered) != expected {
        return Err(StxError::malformed_signature(
            "Signature does not recover to the sender's key",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::{normalize, SignatureComponents};
    use crate::tx::{attach_signature, build_unsigned, UnsignedTransaction};
    use crate::types::{Network, TransferIntent};
    use secp256k1::SecretKey;

    fn keypair() -> (SecretKey, PublicKey) {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[0x42u8; 32]).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);
        (secret, public)
    }

    fn unsigned(public: &PublicKey) -> UnsignedTransaction {
        let intent = TransferIntent::new(
            hex::encode(public.serialize()),
            "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ",
            2_500_000,
            Network::Testnet,
        )
        .with_fee(1000)
        .with_nonce(3);
        build_unsigned(&intent).unwrap()
    }

    fn sign(secret: &SecretKey, tx: &UnsignedTransaction, algorithm: DigestAlgorithm) -> SignatureComponents {
        let digest = pre_sign_digest(tx.transaction(), algorithm).unwrap();
        let message = Message::from_digest(*digest.digest.as_bytes());
        let (recid, bytes) = Secp256k1::new()
            .sign_ecdsa_recoverable(&message, secret)
            .serialize_compact();
        SignatureComponents::split(
            recid.to_i32() as u64,
            hex::encode(&bytes[..32]),
            hex::encode(&bytes[32..]),
        )
    }

    #[test]
    fn test_recovers_sender_key() {
        let (secret, public) = keypair();
        let tx = unsigned(&public);
        let sig = normalize(&sign(&secret, &tx, DigestAlgorithm::Sha256)).unwrap();
        let signed = attach_signature(tx, &sig).unwrap();

        let recovered = recover_signer_public_key(&signed, DigestAlgorithm::Sha256).unwrap();
        assert_eq!(recovered, public.serialize().to_vec());
        assert!(verify_signature(&signed, DigestAlgorithm::Sha256).is_ok());
    }

    #[test]
    fn test_algorithm_mismatch_detected() {
        let (secret, public) = keypair();
        let tx = unsigned(&public);
        let sig = normalize(&sign(&secret, &tx, DigestAlgorithm::Sha512_256)).unwrap();
        let signed = attach_signature(tx, &sig).unwrap();

        assert!(verify_signature(&signed, DigestAlgorithm::Sha512_256).is_ok());
        assert!(verify_signature(&signed, DigestAlgorithm::Sha256).is_err());
    }

    #[test]
    fn test_swapped_byte_order_fails() {
        let (secret, public) = keypair();
        let tx = unsigned(&public);
        let vrs = normalize(&sign(&secret, &tx, DigestAlgorithm::Sha256)).unwrap();

        // Same scalars with r and s exchanged
        let mut swapped = [0u8; 65];
        swapped[0] = vrs.recovery_id();
        swapped[1..33].copy_from_slice(vrs.s());
        swapped[33..].copy_from_slice(vrs.r());
        let swapped = normalize(&SignatureComponents::compact(hex::encode(swapped))).unwrap();

        let signed = attach_signature(tx, &swapped).unwrap();
        assert!(matches!(
            verify_signature(&signed, DigestAlgorithm::Sha256),
            Err(StxError::MalformedSignature(_))
        ));
    }
}

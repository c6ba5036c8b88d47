//! In-process secp256k1 signer for development and tests

use super::{SignRequest, TransactionSigner};
use crate::error::{StxError, StxResult};
use crate::signing::SignatureComponents;
use crate::types::Network;
use crate::wallet::StacksAddress;
use async_trait::async_trait;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use std::fmt;
use zeroize::Zeroizing;

/// Signs with a key held in memory; answers in split `{v, r, s}` form
pub struct LocalKeySigner {
    secret: Zeroizing<[u8; 32]>,
    public_key: PublicKey,
}

impl LocalKeySigner {
    pub fn from_bytes(secret: &[u8; 32]) -> StxResult<Self> {
        let key = SecretKey::from_slice(secret)
            .map_err(|e| StxError::config(format!("Invalid secp256k1 secret key: {}", e)))?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &key);
        Ok(Self {
            secret: Zeroizing::new(*secret),
            public_key,
        })
    }

    pub fn from_hex(secret_hex: &str) -> StxResult<Self> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(secret_hex.trim().trim_start_matches("0x"), &mut bytes[..])
            .map_err(|e| StxError::config(format!("Invalid secret key hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Fresh random key
    pub fn generate() -> Self {
        let (key, public_key) = Secp256k1::new().generate_keypair(&mut rand::thread_rng());
        Self {
            secret: Zeroizing::new(key.secret_bytes()),
            public_key,
        }
    }

    /// Compressed public key, hex
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn address(&self, network: Network) -> StacksAddress {
        StacksAddress::from_public_key(&self.public_key.serialize(), network)
    }
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionSigner for LocalKeySigner {
    async fn sign(&self, request: &SignRequest) -> StxResult<SignatureComponents> {
        let digest = request.digest()?;
        let key = SecretKey::from_slice(&self.secret[..])
            .map_err(|e| StxError::SignerRejected(format!("Key unusable: {}", e)))?;

        let message = Message::from_digest(*digest.as_bytes());
        let (recovery_id, bytes) = Secp256k1::signing_only()
            .sign_ecdsa_recoverable(&message, &key)
            .serialize_compact();

        Ok(SignatureComponents::split(
            recovery_id.to_i32() as u64,
            hex::encode(&bytes[..32]),
            hex::encode(&bytes[32..]),
        ))
    }
}

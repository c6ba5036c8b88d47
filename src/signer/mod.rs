//! Signer Port
//!
//! The boundary to whatever holds the private key. A signer receives a
//! pre-sign digest and an account identifier and answers with signature
//! components; it never sees the transaction itself.

mod custody;
mod local;

pub use custody::*;
pub use local::*;

use crate::error::StxResult;
use crate::signing::SignatureComponents;
use crate::types::Hash256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a signer is asked to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// `0x` + 64 hex chars
    pub digest_hex: String,
    pub account: String,
    /// Always `hex`
    pub encoding: String,
    /// Always `none`: the digest is signed as-is
    pub hash_function: String,
}

impl SignRequest {
    pub fn new(digest: &Hash256, account: impl Into<String>) -> Self {
        Self {
            digest_hex: digest.to_prefixed_hex(),
            account: account.into(),
            encoding: "hex".to_string(),
            hash_function: "none".to_string(),
        }
    }

    /// The digest bytes carried by this request
    pub fn digest(&self) -> StxResult<Hash256> {
        Ok(Hash256::from_hex(&self.digest_hex)?)
    }
}

/// Asynchronous signing capability.
///
/// Implementations make exactly one attempt per call; retry policy belongs
/// to the caller.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign(&self, request: &SignRequest) -> StxResult<SignatureComponents>;
}

#[async_trait]
impl<T: TransactionSigner + ?Sized> TransactionSigner for Arc<T> {
    async fn sign(&self, request: &SignRequest) -> StxResult<SignatureComponents> {
        (**self).sign(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_request_shape() {
        let request = SignRequest::new(&Hash256([0xab; 32]), "acct-1");
        assert_eq!(request.digest_hex.len(), 66);
        assert!(request.digest_hex.starts_with("0x"));
        assert_eq!(request.digest().unwrap(), Hash256([0xab; 32]));

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["encoding"], "hex");
        assert_eq!(json["hashFunction"], "none");
        assert_eq!(json["account"], "acct-1");
    }
}

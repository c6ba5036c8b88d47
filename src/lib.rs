//! STX Custody Library
//!
//! Builds Stacks STX token transfers for keys held by an external custody
//! signer, then broadcasts them.
//!
//! # Architecture
//!
//! This crate provides:
//! - **tx**: Transaction wire model, assembly and broadcast
//! - **signing**: Pre-sign digests, signature normalization and verification
//! - **signer**: The signer port with custody API and in-process implementations
//! - **transfer**: The pipeline wiring all of the above together
//! - **api**: Read clients for balance, nonce and history
//! - **wallet**: Addresses, amounts and nonce allocation
//!
//! # Security
//!
//! Private keys never enter the pipeline; signers only see a 32-byte digest.
//! The in-process signer zeroes its key on drop, and custody API credentials
//! are held as `SecretString`.
//!
//! # Example
//!
//! ```rust,ignore
//! use stx_custody::{Broadcaster, LocalKeySigner, Network, NodeConfig};
//! use stx_custody::{TransferIntent, TransferPipeline, TransferPolicy};
//!
//! let signer = LocalKeySigner::generate();
//! let intent = TransferIntent::new(signer.public_key_hex(), "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ", 1_000, Network::Testnet);
//! let broadcaster = Broadcaster::new(NodeConfig::for_network(Network::Testnet)?)?;
//! let receipt = TransferPipeline::new(signer, broadcaster, TransferPolicy::default())
//!     .send(&intent)
//!     .await?;
//! println!("{}", receipt.explorer_url);
//! ```

pub mod api;
pub mod error;
pub mod signer;
pub mod signing;
pub mod transfer;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use error::{ErrorCode, StxError, StxResult};
pub use types::*;

pub use api::{AccountInfo, Balance, HistoryPage, NodeClient};
pub use signer::{CustodyConfig, CustodySigner, LocalKeySigner, SignRequest, TransactionSigner};
pub use signing::{
    normalize, pre_sign_digest, verify_signature, CompactSignature, DigestAlgorithm,
    PreSignDigest, SignatureComponents,
};
pub use transfer::{PreparedTransfer, TransferPipeline, TransferPolicy};
pub use tx::{
    attach_signature, build_unsigned, Broadcaster, SignedTransaction, StacksTransaction,
    UnsignedTransaction,
};
pub use utils::logging::{init_tracing, LogFormat};
pub use utils::NodeConfig;
pub use wallet::{ContractName, NonceAllocator, Principal, StacksAddress};

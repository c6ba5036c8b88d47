//! Wallet Module
//!
//! Account-level helpers around a transfer: c32 addresses and principals,
//! µSTX amount conversion, and per-sender nonce allocation.

mod address;
mod amount;
pub mod nonce;

pub use address::*;
pub use amount::*;
pub use nonce::NonceAllocator;

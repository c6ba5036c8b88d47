//! Hash Primitives
//!
//! Hash functions used by the Stacks wire format, addresses and digests.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512_256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Double SHA-256 (c32check checksums)
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// SHA-512/256, the chain's transaction id and sig-hash function
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    Sha512_256::digest(data).into()
}

/// RIPEMD160(SHA256(data)), used for account hashes
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

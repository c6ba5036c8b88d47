//! External Signature Support
//!
//! The three pure steps around an external signer:
//! 1. Compute the pre-sign digest of an unsigned transfer
//! 2. Normalize whatever the signer returns into `v ‖ r ‖ s`
//! 3. Verify an attached signature against the sender's key

pub mod preimage;
pub mod signature;
pub mod verification;

pub use preimage::*;
pub use signature::*;
pub use verification::*;

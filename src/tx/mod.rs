//! Transaction Module
//!
//! Wire model, codec, assembly and broadcast of STX token transfers.

mod broadcaster;
mod builder;
mod codec;
mod types;

pub use broadcaster::*;
pub use builder::*;
pub use types::*;

//! Utilities Module
//!
//! Common utilities used across the crate.

mod http;
pub mod crypto;
pub mod logging;
pub mod network_config;

pub use crypto::*;
pub use http::*;
pub use network_config::NodeConfig;

//! Signature Normalization
//!
//! Signers answer in several shapes. Each shape is one variant of
//! [`SignatureComponents`] with its own normalizer, and all of them end in
//! the 65-byte `v ‖ r ‖ s` layout the spending condition stores.

use crate::error::{StxError, StxResult};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const COMPACT_SIGNATURE_LEN: usize = 65;
const COMPACT_HEX_LEN: usize = COMPACT_SIGNATURE_LEN * 2;
const SCALAR_HEX_LEN: usize = 64;

/// Raw signer output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignatureComponents {
    /// Separate recovery id and scalars
    Split {
        #[serde(deserialize_with = "deserialize_recovery_value")]
        v: u64,
        r: String,
        s: String,
    },
    /// `v ‖ r ‖ s` as one hex string
    Compact {
        #[serde(rename = "compactHex", alias = "compact")]
        compact: String,
    },
    /// `v ‖ r ‖ s` as base64
    Base64 {
        #[serde(rename = "signatureBase64")]
        signature_base64: String,
    },
}

impl SignatureComponents {
    pub fn split(v: u64, r: impl Into<String>, s: impl Into<String>) -> Self {
        SignatureComponents::Split {
            v,
            r: r.into(),
            s: s.into(),
        }
    }

    pub fn compact(hex: impl Into<String>) -> Self {
        SignatureComponents::Compact {
            compact: hex.into(),
        }
    }

    pub fn base64(encoded: impl Into<String>) -> Self {
        SignatureComponents::Base64 {
            signature_base64: encoded.into(),
        }
    }
}

/// Custody services send `v` as a number or a string.
///
/// A string with `0x` is hex. A string of decimal digits without `0x` is
/// decimal, so `"27"` is 27; any other string is hex (`"1b"`). Every valid
/// recovery value (0-3, 27-30) reads the same under either base.
fn deserialize_recovery_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(text) => parse_recovery_text(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid recovery value '{}'", text))),
    }
}

/// Canonical 65-byte recoverable signature, recovery id first
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CompactSignature([u8; COMPACT_SIGNATURE_LEN]);

impl CompactSignature {
    /// Parse 130 hex chars (optional `0x`)
    pub fn from_hex(hex_str: &str) -> StxResult<Self> {
        normalize_compact(hex_str)
    }

    pub fn as_bytes(&self) -> &[u8; COMPACT_SIGNATURE_LEN] {
        &self.0
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[0]
    }

    pub fn r(&self) -> &[u8] {
        &self.0[1..33]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[33..]
    }

    /// Lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({})", self.to_hex())
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompactSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        normalize_compact(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_recovery_text(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16).ok(),
        None if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) => {
            trimmed.parse().ok()
        }
        None => u64::from_str_radix(trimmed, 16).ok(),
    }
}

/// Convert any signer output into the canonical compact form
pub fn normalize(signature: &SignatureComponents) -> StxResult<CompactSignature> {
    match signature {
        SignatureComponents::Split { v, r, s } => normalize_split(*v, r, s),
        SignatureComponents::Compact { compact } => normalize_compact(compact),
        SignatureComponents::Base64 { signature_base64 } => normalize_base64(signature_base64),
    }
}

/// Recovery ids 27-30 are the Ethereum offset form of 0-3
fn recovery_byte(v: u64) -> StxResult<u8> {
    let id = if (27..=30).contains(&v) { v - 27 } else { v };
    if id > 3 {
        return Err(StxError::malformed_signature(format!(
            "Recovery id {} is not in 0-3",
            v
        )));
    }
    Ok(id as u8)
}

fn strip_hex_prefix(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

fn normalize_scalar(name: &str, value: &str) -> StxResult<[u8; 32]> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err(StxError::malformed_signature(format!("{} is empty", name)));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StxError::malformed_signature(format!("{} is not hex", name)));
    }

    // Leading zeros beyond 32 bytes carry no value
    let significant = if digits.len() > SCALAR_HEX_LEN {
        digits.trim_start_matches('0')
    } else {
        digits
    };
    if significant.len() > SCALAR_HEX_LEN {
        return Err(StxError::malformed_signature(format!(
            "{} exceeds 32 bytes ({} hex chars)",
            name,
            digits.len()
        )));
    }

    let padded = format!("{:0>width$}", significant, width = SCALAR_HEX_LEN);
    let mut out = [0u8; 32];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|e| StxError::malformed_signature(format!("{}: {}", name, e)))?;
    Ok(out)
}

fn normalize_split(v: u64, r: &str, s: &str) -> StxResult<CompactSignature> {
    let mut out = [0u8; COMPACT_SIGNATURE_LEN];
    out[0] = recovery_byte(v)?;
    out[1..33].copy_from_slice(&normalize_scalar("r", r)?);
    out[33..].copy_from_slice(&normalize_scalar("s", s)?);
    Ok(CompactSignature(out))
}

fn normalize_compact(value: &str) -> StxResult<CompactSignature> {
    let digits = strip_hex_prefix(value);
    if digits.len() != COMPACT_HEX_LEN {
        return Err(StxError::malformed_signature(format!(
            "Compact signature must be {} hex chars, got {}",
            COMPACT_HEX_LEN,
            digits.len()
        )));
    }

    let mut out = [0u8; COMPACT_SIGNATURE_LEN];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| StxError::malformed_signature(format!("Compact signature: {}", e)))?;
    out[0] = recovery_byte(out[0] as u64)?;
    Ok(CompactSignature(out))
}

fn normalize_base64(value: &str) -> StxResult<CompactSignature> {
    let trimmed = value.trim();
    let raw = STANDARD
        .decode(trimmed)
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed.trim_end_matches('=')))
        .map_err(|e| StxError::malformed_signature(format!("Invalid base64 signature: {}", e)))?;

    if raw.len() != COMPACT_SIGNATURE_LEN {
        return Err(StxError::malformed_signature(format!(
            "Base64 signature decodes to {} bytes, expected {}",
            raw.len(),
            COMPACT_SIGNATURE_LEN
        )));
    }
    normalize_compact(&hex::encode(raw))
}

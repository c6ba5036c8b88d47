//! Stacks Address Handling
//!
//! c32check encoding/decoding and principal parsing for transfer recipients.

use crate::error::{StxError, StxResult};
use crate::types::Network;
use crate::utils::crypto::{hash160, sha256d};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Longest contract name the chain accepts
pub const MAX_CONTRACT_NAME_LEN: usize = 40;

// =============================================================================
// c32 Encoding
// =============================================================================

/// Encode bytes as c32 (one leading `0` per leading zero byte)
pub fn c32_encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|b| **b == 0).count();

    // Base conversion 256 -> 32, little-endian digits
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 8 / 5 + 1);
    for byte in &data[zeros..] {
        let mut carry = *byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 32) as u8;
            carry /= 32;
        }
        while carry > 0 {
            digits.push((carry % 32) as u8);
            carry /= 32;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        out.push('0');
    }
    for digit in digits.iter().rev() {
        out.push(C32_ALPHABET[*digit as usize] as char);
    }
    out
}

fn c32_digit(ch: char) -> Option<u8> {
    let normalized = match ch.to_ascii_uppercase() {
        'O' => '0',
        'I' | 'L' => '1',
        other => other,
    };
    C32_ALPHABET
        .iter()
        .position(|c| *c as char == normalized)
        .map(|p| p as u8)
}

/// Decode c32 text back into bytes
pub fn c32_decode(input: &str) -> StxResult<Vec<u8>> {
    let digits = input
        .chars()
        .map(|ch| {
            c32_digit(ch).ok_or_else(|| StxError::codec(format!("Invalid c32 character '{}'", ch)))
        })
        .collect::<StxResult<Vec<u8>>>()?;

    let zeros = digits.iter().take_while(|d| **d == 0).count();

    // Base conversion 32 -> 256, little-endian bytes
    let mut bytes: Vec<u8> = Vec::with_capacity(digits.len() * 5 / 8 + 1);
    for digit in &digits[zeros..] {
        let mut carry = *digit as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) << 5;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}

fn c32_checksum(version: u8, hash: &[u8; 20]) -> [u8; 4] {
    let mut data = Vec::with_capacity(21);
    data.push(version);
    data.extend_from_slice(hash);
    let digest = sha256d(&data);
    [digest[0], digest[1], digest[2], digest[3]]
}

// =============================================================================
// Addresses
// =============================================================================

/// A standard Stacks account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StacksAddress {
    version: u8,
    hash160: [u8; 20],
}

impl StacksAddress {
    pub fn new(version: u8, hash160: [u8; 20]) -> StxResult<Self> {
        if version >= 32 {
            return Err(StxError::codec(format!("Address version {} out of range", version)));
        }
        Ok(Self { version, hash160 })
    }

    /// Single-signature address controlled by `public_key`
    pub fn from_public_key(public_key: &[u8], network: Network) -> Self {
        Self {
            version: network.single_sig_address_version(),
            hash160: hash160(public_key),
        }
    }

    /// c32 version, always below 32
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }

    pub fn network(&self) -> Option<Network> {
        Network::from_address_version(self.version)
    }

    /// Encode as `S` + version character + c32(hash160 ‖ checksum)
    pub fn to_c32(&self) -> String {
        let mut payload = Vec::with_capacity(24);
        payload.extend_from_slice(&self.hash160);
        payload.extend_from_slice(&c32_checksum(self.version, &self.hash160));

        let mut out = String::with_capacity(41);
        out.push('S');
        out.push(C32_ALPHABET[self.version as usize] as char);
        out.push_str(&c32_encode(&payload));
        out
    }

    pub fn from_c32(address: &str) -> StxResult<Self> {
        let mut chars = address.chars();
        if !matches!(chars.next(), Some('S') | Some('s')) {
            return Err(StxError::codec(format!("Address must start with 'S': {}", address)));
        }
        let version = chars
            .next()
            .and_then(c32_digit)
            .ok_or_else(|| StxError::codec("Address is missing its version character"))?;

        let payload = c32_decode(chars.as_str())?;
        if payload.len() != 24 {
            return Err(StxError::codec(format!(
                "Address payload must be 24 bytes, got {}",
                payload.len()
            )));
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[..20]);
        if payload[20..] != c32_checksum(version, &hash) {
            return Err(StxError::codec(format!("Address checksum mismatch: {}", address)));
        }

        Ok(Self {
            version,
            hash160: hash,
        })
    }
}

impl fmt::Display for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_c32())
    }
}

impl FromStr for StacksAddress {
    type Err = StxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_c32(s)
    }
}

impl Serialize for StacksAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_c32())
    }
}

impl<'de> Deserialize<'de> for StacksAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_c32(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Principals
// =============================================================================

/// A contract name that passed [`validate_contract_name`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractName(String);

impl ContractName {
    pub fn new(name: impl Into<String>) -> StxResult<Self> {
        let name = name.into();
        validate_contract_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes; at most [`MAX_CONTRACT_NAME_LEN`]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recipient of a token transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    Standard(StacksAddress),
    Contract(StacksAddress, ContractName),
}

impl Principal {
    pub fn address(&self) -> &StacksAddress {
        match self {
            Principal::Standard(addr) | Principal::Contract(addr, _) => addr,
        }
    }

    pub fn parse(input: &str) -> StxResult<Self> {
        let input = input.trim();
        match input.split_once('.') {
            None => Ok(Principal::Standard(StacksAddress::from_c32(input)?)),
            Some((address, name)) => Ok(Principal::Contract(
                StacksAddress::from_c32(address)?,
                ContractName::new(name)?,
            )),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Standard(addr) => write!(f, "{}", addr),
            Principal::Contract(addr, name) => write!(f, "{}.{}", addr, name),
        }
    }
}

impl FromStr for Principal {
    type Err = StxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub fn validate_contract_name(name: &str) -> StxResult<()> {
    if name.is_empty() || name.len() > MAX_CONTRACT_NAME_LEN {
        return Err(StxError::codec(format!(
            "Contract name must be 1-{} characters",
            MAX_CONTRACT_NAME_LEN
        )));
    }

    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !first_ok || !rest_ok {
        return Err(StxError::codec(format!("Invalid contract name: {}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_MAINNET: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    const KNOWN_HASH: &str = "a46ff88886c2ef9762d970b4d2c63678835bd39d";

    #[test]
    fn test_decode_known_address() {
        let addr = StacksAddress::from_c32(KNOWN_MAINNET).unwrap();
        assert_eq!(addr.version(), 22);
        assert_eq!(hex::encode(addr.hash160()), KNOWN_HASH);
        assert_eq!(addr.network(), Some(Network::Mainnet));
    }

    #[test]
    fn test_encode_known_address() {
        let mut hash = [0u8; 20];
        hex::decode_to_slice(KNOWN_HASH, &mut hash).unwrap();
        assert_eq!(StacksAddress::new(22, hash).unwrap().to_c32(), KNOWN_MAINNET);
        assert_eq!(
            StacksAddress::new(26, hash).unwrap().to_c32(),
            "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ"
        );
    }

    #[test]
    fn test_zero_hash_addresses() {
        assert_eq!(
            StacksAddress::new(22, [0u8; 20]).unwrap().to_c32(),
            "SP000000000000000000002Q6VF78"
        );
        assert_eq!(
            StacksAddress::new(26, [0u8; 20]).unwrap().to_c32(),
            "ST000000000000000000002AMW42H"
        );
        let decoded = StacksAddress::from_c32("ST000000000000000000002AMW42H").unwrap();
        assert_eq!(decoded.hash160(), &[0u8; 20]);
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        // Last character altered
        assert!(StacksAddress::from_c32("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ8").is_err());
        assert!(StacksAddress::from_c32("XP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7").is_err());
        assert!(StacksAddress::from_c32("SPU").is_err());
    }

    #[test]
    fn test_lowercase_accepted() {
        let lower = KNOWN_MAINNET.to_lowercase();
        let addr = StacksAddress::from_c32(&lower).unwrap();
        assert_eq!(addr.to_c32(), KNOWN_MAINNET);
    }

    #[test]
    fn test_address_from_public_key() {
        let pk = hex::decode("0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798")
            .unwrap();
        let addr = StacksAddress::from_public_key(&pk, Network::Testnet);
        assert_eq!(addr.version(), 26);
        assert_eq!(hex::encode(addr.hash160()), "751e76e8199196d454941c45d1b3a323f1433bd6");
        assert!(addr.to_c32().starts_with("ST"));
    }

    #[test]
    fn test_principal_parsing() {
        let standard = Principal::parse(KNOWN_MAINNET).unwrap();
        assert!(matches!(standard, Principal::Standard(_)));

        let contract = Principal::parse(&format!("{}.my-vault_v2", KNOWN_MAINNET)).unwrap();
        match &contract {
            Principal::Contract(addr, name) => {
                assert_eq!(addr.version(), 22);
                assert_eq!(name.as_str(), "my-vault_v2");
            }
            _ => panic!("expected contract principal"),
        }
        assert_eq!(contract.to_string(), format!("{}.my-vault_v2", KNOWN_MAINNET));

        assert!(Principal::parse(&format!("{}.1bad", KNOWN_MAINNET)).is_err());
        assert!(Principal::parse(&format!("{}.", KNOWN_MAINNET)).is_err());
        assert!(Principal::parse(&format!("{}.{}", KNOWN_MAINNET, "a".repeat(41))).is_err());
    }

    #[test]
    fn test_out_of_range_parts_cannot_be_built() {
        assert!(StacksAddress::new(32, [0u8; 20]).is_err());
        let highest = StacksAddress::new(31, [7u8; 20]).unwrap();
        assert_eq!(StacksAddress::from_c32(&highest.to_c32()).unwrap(), highest);

        assert!(ContractName::new("a".repeat(256)).is_err());
        assert!(ContractName::new("a".repeat(MAX_CONTRACT_NAME_LEN + 1)).is_err());
        let longest = ContractName::new("a".repeat(MAX_CONTRACT_NAME_LEN)).unwrap();
        assert_eq!(longest.len(), MAX_CONTRACT_NAME_LEN);
    }
}

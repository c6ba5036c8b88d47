//! Transaction Wire Codec
//!
//! Canonical byte encoding of token transfers, as the node consumes them.
//! All integers are big-endian.

use super::types::*;
use crate::error::{StxError, StxResult};
use crate::types::{Hash256, Network, MAX_MEMO_BYTES};
use crate::utils::crypto::sha512_256;
use crate::wallet::{ContractName, Principal, StacksAddress};

const PAYLOAD_TOKEN_TRANSFER: u8 = 0x00;
const PRINCIPAL_STANDARD: u8 = 0x05;
const PRINCIPAL_CONTRACT: u8 = 0x06;

impl StacksTransaction {
    /// Canonical wire encoding
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(180);
        out.push(self.network.transaction_version());
        out.extend_from_slice(&self.chain_id.to_be_bytes());

        out.push(self.auth.auth_type() as u8);
        match &self.auth {
            TransactionAuth::Standard(origin) => write_condition(&mut out, origin),
            TransactionAuth::Sponsored(origin, sponsor) => {
                write_condition(&mut out, origin);
                write_condition(&mut out, sponsor);
            }
        }

        out.push(self.anchor_mode as u8);
        out.push(self.post_condition_mode as u8);
        // Post conditions are never attached
        out.extend_from_slice(&0u32.to_be_bytes());

        out.push(PAYLOAD_TOKEN_TRANSFER);
        write_principal(&mut out, &self.payload.recipient);
        out.extend_from_slice(&self.payload.amount.to_be_bytes());
        out.extend_from_slice(&self.payload.memo);
        out
    }

    /// SHA-512/256 over the wire encoding
    pub fn txid(&self) -> Hash256 {
        Hash256(sha512_256(&self.serialize()))
    }

    /// Parse a standard single-signature token transfer
    pub fn from_bytes(bytes: &[u8]) -> StxResult<Self> {
        let mut reader = ByteReader::new(bytes);

        let version = reader.read_u8()?;
        let network = Network::from_transaction_version(version)
            .ok_or_else(|| StxError::codec(format!("Unknown transaction version 0x{:02x}", version)))?;
        let chain_id = reader.read_u32()?;

        let auth_byte = reader.read_u8()?;
        match AuthType::from_u8(auth_byte) {
            Some(AuthType::Standard) => {}
            Some(AuthType::Sponsored) => {
                return Err(StxError::UnsupportedAuthKind("sponsored".to_string()))
            }
            None => return Err(StxError::codec(format!("Unknown auth type 0x{:02x}", auth_byte))),
        }
        let origin = read_single_sig_condition(&mut reader)?;

        let anchor_byte = reader.read_u8()?;
        let anchor_mode = AnchorMode::from_u8(anchor_byte)
            .ok_or_else(|| StxError::codec(format!("Unknown anchor mode 0x{:02x}", anchor_byte)))?;
        let pc_byte = reader.read_u8()?;
        let post_condition_mode = PostConditionMode::from_u8(pc_byte).ok_or_else(|| {
            StxError::codec(format!("Unknown post-condition mode 0x{:02x}", pc_byte))
        })?;
        let post_conditions = reader.read_u32()?;
        if post_conditions != 0 {
            return Err(StxError::codec(format!(
                "Post conditions are not supported ({} present)",
                post_conditions
            )));
        }

        let payload_type = reader.read_u8()?;
        if payload_type != PAYLOAD_TOKEN_TRANSFER {
            return Err(StxError::codec(format!(
                "Unsupported payload type 0x{:02x}",
                payload_type
            )));
        }
        let recipient = read_principal(&mut reader)?;
        let amount = reader.read_u64()?;
        let memo = reader.read_array::<MAX_MEMO_BYTES>()?;

        reader.finish()?;

        Ok(StacksTransaction {
            network,
            chain_id,
            auth: TransactionAuth::Standard(SpendingCondition::SingleSig(origin)),
            anchor_mode,
            post_condition_mode,
            payload: TokenTransferPayload {
                recipient,
                amount,
                memo,
            },
        })
    }
}

fn write_condition(out: &mut Vec<u8>, condition: &SpendingCondition) {
    match condition {
        SpendingCondition::SingleSig(c) => {
            out.push(c.hash_mode as u8);
            out.extend_from_slice(&c.signer);
            out.extend_from_slice(&c.nonce.to_be_bytes());
            out.extend_from_slice(&c.fee.to_be_bytes());
            out.push(c.key_encoding as u8);
            out.extend_from_slice(&c.signature.0);
        }
        SpendingCondition::MultiSig(c) => {
            out.push(c.hash_mode as u8);
            out.extend_from_slice(&c.signer);
            out.extend_from_slice(&c.nonce.to_be_bytes());
            out.extend_from_slice(&c.fee.to_be_bytes());
            // No auth fields
            out.extend_from_slice(&0u32.to_be_bytes());
            out.extend_from_slice(&c.signatures_required.to_be_bytes());
        }
    }
}

fn write_principal(out: &mut Vec<u8>, principal: &Principal) {
    match principal {
        Principal::Standard(addr) => {
            out.push(PRINCIPAL_STANDARD);
            out.push(addr.version());
            out.extend_from_slice(addr.hash160());
        }
        Principal::Contract(addr, name) => {
            out.push(PRINCIPAL_CONTRACT);
            out.push(addr.version());
            out.extend_from_slice(addr.hash160());
            // ContractName holds at most 40 ASCII bytes
            out.push(name.len() as u8);
            out.extend_from_slice(name.as_str().as_bytes());
        }
    }
}

fn read_single_sig_condition(reader: &mut ByteReader<'_>) -> StxResult<SingleSigSpendingCondition> {
    let mode_byte = reader.read_u8()?;
    let hash_mode = HashMode::from_u8(mode_byte)
        .ok_or_else(|| StxError::codec(format!("Unknown hash mode 0x{:02x}", mode_byte)))?;
    if !hash_mode.is_single_sig() {
        return Err(StxError::UnsupportedAuthKind(format!(
            "multi-signature ({:?})",
            hash_mode
        )));
    }

    let signer = reader.read_array::<20>()?;
    let nonce = reader.read_u64()?;
    let fee = reader.read_u64()?;
    let encoding_byte = reader.read_u8()?;
    let key_encoding = KeyEncoding::from_u8(encoding_byte)
        .ok_or_else(|| StxError::codec(format!("Unknown key encoding 0x{:02x}", encoding_byte)))?;
    let signature = MessageSignature(reader.read_array::<MESSAGE_SIGNATURE_LEN>()?);

    Ok(SingleSigSpendingCondition {
        hash_mode,
        signer,
        nonce,
        fee,
        key_encoding,
        signature,
    })
}

fn read_principal(reader: &mut ByteReader<'_>) -> StxResult<Principal> {
    let kind = reader.read_u8()?;
    let version = reader.read_u8()?;
    let hash = reader.read_array::<20>()?;
    let address = StacksAddress::new(version, hash)?;

    match kind {
        PRINCIPAL_STANDARD => Ok(Principal::Standard(address)),
        PRINCIPAL_CONTRACT => {
            let len = reader.read_u8()? as usize;
            let name_bytes = reader.read_slice(len)?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| StxError::codec("Contract name is not UTF-8"))?;
            Ok(Principal::Contract(address, ContractName::new(name)?))
        }
        other => Err(StxError::codec(format!("Unknown principal type 0x{:02x}", other))),
    }
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_slice(&mut self, len: usize) -> StxResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                StxError::codec(format!(
                    "Unexpected end of input at byte {} (need {} more)",
                    self.pos, len
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> StxResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> StxResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u32(&mut self) -> StxResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> StxResult<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    fn finish(&self) -> StxResult<()> {
        if self.pos != self.data.len() {
            return Err(StxError::codec(format!(
                "{} trailing bytes after transaction",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

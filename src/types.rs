//! Core value types shared across the ledger and the orchestration layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 32-byte content hash (BLAKE3).
pub type Hash = [u8; 32];

/// Arbitrary byte payload (call data, contract code).
pub type Bytes = Vec<u8>;

/// The all-zero salt used for deterministic deployments with no explicit salt.
pub const EMPTY_SALT: Hash = [0u8; 32];

/// A 20-byte account or contract address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, std::hash::Hash, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Used as the "absent" sentinel throughout the ledger
    /// read surface, and as a deletion marker in abstract proposals.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Derive an address from the trailing 20 bytes of a hash.
    pub fn from_hash(hash: &Hash) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..32]);
        Address(bytes)
    }

    /// Parse a `0x`-prefixed or bare 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(stripped)?;
        if raw.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(Address(bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

/// Parse a `0x`-prefixed 32-byte hex string into a salt/hash value.
pub fn parse_hash(s: &str) -> Result<Hash, hex::FromHexError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let raw = hex::decode(stripped)?;
    if raw.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&raw);
    Ok(hash)
}

/// Render a hash as a `0x`-prefixed hex string.
pub fn hash_to_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

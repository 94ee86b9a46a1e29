//! Core identifiers shared by the schema, codec, and ledger layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 256-bit BLAKE2b digest, rendered as `0x` followed by 64 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct H256(pub [u8; 32]);

/// Content hash identifying a schema definition.
pub type SchemaHash = H256;

/// Hash of an issuer's name, the issuer's identity on the ledger.
pub type IssuerHash = H256;

/// Ledger-assigned attestation identifier.
pub type AttestationId = u64;

impl H256 {
    pub const fn zero() -> Self {
        H256([0u8; 32])
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for H256 {
    fn from(bytes: [u8; 32]) -> Self {
        H256(bytes)
    }
}

impl AsRef<[u8]> for H256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    #[error("Missing 0x prefix")]
    MissingPrefix,

    #[error("Invalid hash length: expected 64 hex digits, got {0}")]
    InvalidLength(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

impl FromStr for H256 {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").ok_or(HashParseError::MissingPrefix)?;
        if digits.len() != 64 {
            return Err(HashParseError::InvalidLength(digits.len()));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Ok(H256(bytes))
    }
}

impl TryFrom<String> for H256 {
    type Error = HashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<H256> for String {
    fn from(hash: H256) -> Self {
        hash.to_string()
    }
}

/// Ed25519 signature (64 bytes) - wrapped for Serde support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBytes(#[serde(with = "serde_arrays")] pub [u8; 64]);

impl From<[u8; 64]> for SignatureBytes {
    fn from(bytes: [u8; 64]) -> Self {
        SignatureBytes(bytes)
    }
}

impl AsRef<[u8; 64]> for SignatureBytes {
    fn as_ref(&self) -> &[u8; 64] {
        &self.0
    }
}

// Serde support for large arrays
mod serde_arrays {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        bytes.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        bytes.try_into()
            .map_err(|_| serde::de::Error::custom("Invalid signature length"))
    }
}

/// Ledger account address (the subject of an attestation, or a controller).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress(pub String);

impl AccountAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountAddress {
    fn from(s: &str) -> Self {
        AccountAddress(s.to_string())
    }
}

impl From<String> for AccountAddress {
    fn from(s: String) -> Self {
        AccountAddress(s)
    }
}

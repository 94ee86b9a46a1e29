//! Primitive type catalog for schema fields.
//!
//! Every schema field is declared as one of fourteen primitive types. A type's
//! `id` and `size_in_bytes` are part of every schema hash and every stored
//! attestation, so they are fixed forever:
//!
//! | type    | id | bytes |
//! |---------|----|-------|
//! | char    | 0  | 1     |
//! | u8      | 1  | 1     |
//! | i8      | 2  | 1     |
//! | u16     | 3  | 2     |
//! | i16     | 4  | 2     |
//! | u32     | 5  | 4     |
//! | i32     | 6  | 4     |
//! | u64     | 7  | 8     |
//! | i64     | 8  | 8     |
//! | f32     | 9  | 4     |
//! | f64     | 10 | 8     |
//! | hash256 | 11 | 32    |
//! | bool    | 12 | 1     |
//! | text    | 13 | < 128 |
//!
//! Numeric, char and bool values encode as fixed-width little-endian bytes.
//! Hashes encode as their 32 raw bytes and text as raw UTF-8 (no length prefix).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::crypto::blake2b_256;
use crate::types::H256;

/// A schema field's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Char,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Hash256,
    Bool,
    Text,
}

/// A concrete field value.
///
/// All integer types share `Int`; the declared [`PrimitiveType`] decides the
/// accepted range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Char(char),
    Int(i128),
    Float(f64),
    Hash(H256),
    Bool(bool),
    Text(String),
}

/// One encoded field value, as carried in an attestation payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Encoded(pub Vec<u8>);

/// A field value as returned by a ledger query.
///
/// Ledgers hand back either encoded bytes (raw or as a hex string) or, for
/// small numeric values, a native integer. [`PrimitiveType::normalize`] turns
/// every shape into encoded bytes before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawValue {
    Bytes(Vec<u8>),
    Hex(String),
    Int(i128),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Value {value} is not a valid {ty}")]
    OutOfDomain { ty: PrimitiveType, value: String },

    #[error("Invalid {ty} width: expected {expected} bytes, got {actual}")]
    WidthMismatch {
        ty: PrimitiveType,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {ty} encoding: {reason}")]
    InvalidEncoding { ty: PrimitiveType, reason: String },
}

impl PrimitiveType {
    /// Every type, in id order.
    pub const ALL: [PrimitiveType; 14] = [
        PrimitiveType::Char,
        PrimitiveType::U8,
        PrimitiveType::I8,
        PrimitiveType::U16,
        PrimitiveType::I16,
        PrimitiveType::U32,
        PrimitiveType::I32,
        PrimitiveType::U64,
        PrimitiveType::I64,
        PrimitiveType::F32,
        PrimitiveType::F64,
        PrimitiveType::Hash256,
        PrimitiveType::Bool,
        PrimitiveType::Text,
    ];

    /// Stable numeric identifier, embedded in schema hashes.
    pub const fn id(self) -> u8 {
        match self {
            PrimitiveType::Char => 0,
            PrimitiveType::U8 => 1,
            PrimitiveType::I8 => 2,
            PrimitiveType::U16 => 3,
            PrimitiveType::I16 => 4,
            PrimitiveType::U32 => 5,
            PrimitiveType::I32 => 6,
            PrimitiveType::U64 => 7,
            PrimitiveType::I64 => 8,
            PrimitiveType::F32 => 9,
            PrimitiveType::F64 => 10,
            PrimitiveType::Hash256 => 11,
            PrimitiveType::Bool => 12,
            PrimitiveType::Text => 13,
        }
    }

    /// Encoded width. For `Text` this is the exclusive upper bound.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            PrimitiveType::Char | PrimitiveType::U8 | PrimitiveType::I8 | PrimitiveType::Bool => 1,
            PrimitiveType::U16 | PrimitiveType::I16 => 2,
            PrimitiveType::U32 | PrimitiveType::I32 | PrimitiveType::F32 => 4,
            PrimitiveType::U64 | PrimitiveType::I64 | PrimitiveType::F64 => 8,
            PrimitiveType::Hash256 => 32,
            PrimitiveType::Text => 128,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Char => "char",
            PrimitiveType::U8 => "u8",
            PrimitiveType::I8 => "i8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::I16 => "i16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::I32 => "i32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Hash256 => "hash256",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Text => "text",
        }
    }

    /// Whether every encoding of this type has exactly `size_in_bytes` bytes.
    pub const fn is_fixed_width(self) -> bool {
        !matches!(self, PrimitiveType::Text)
    }

    /// Inclusive integer domain for the integer types.
    fn int_range(self) -> Option<(i128, i128)> {
        let range = match self {
            PrimitiveType::U8 => (0, u8::MAX as i128),
            PrimitiveType::I8 => (i8::MIN as i128, i8::MAX as i128),
            PrimitiveType::U16 => (0, u16::MAX as i128),
            PrimitiveType::I16 => (i16::MIN as i128, i16::MAX as i128),
            PrimitiveType::U32 => (0, u32::MAX as i128),
            PrimitiveType::I32 => (i32::MIN as i128, i32::MAX as i128),
            PrimitiveType::U64 => (0, u64::MAX as i128),
            PrimitiveType::I64 => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Check that `value` lies in this type's domain.
    pub fn is_valid(self, value: &Value) -> bool {
        match (self, value) {
            (PrimitiveType::Char, Value::Char(c)) => c.is_ascii(),
            // only values an f32 holds exactly, so decoding gives back the same value
            (PrimitiveType::F32, Value::Float(f)) => f.is_finite() && (*f as f32) as f64 == *f,
            (PrimitiveType::F64, Value::Float(f)) => f.is_finite(),
            (PrimitiveType::Hash256, Value::Hash(_)) => true,
            (PrimitiveType::Bool, Value::Bool(_)) => true,
            (PrimitiveType::Text, Value::Text(s)) => s.len() < self.size_in_bytes(),
            (ty, Value::Int(n)) => match ty.int_range() {
                Some((min, max)) => (min..=max).contains(n),
                None => false,
            },
            _ => false,
        }
    }

    /// Encode a value. Values outside the domain are rejected rather than truncated.
    pub fn serialize(self, value: &Value) -> Result<Encoded, CatalogError> {
        if !self.is_valid(value) {
            return Err(CatalogError::OutOfDomain {
                ty: self,
                value: value.to_string(),
            });
        }

        let bytes = match (self, value) {
            (PrimitiveType::Char, Value::Char(c)) => vec![*c as u8],
            (PrimitiveType::U8, Value::Int(n)) => (*n as u8).to_le_bytes().to_vec(),
            (PrimitiveType::I8, Value::Int(n)) => (*n as i8).to_le_bytes().to_vec(),
            (PrimitiveType::U16, Value::Int(n)) => (*n as u16).to_le_bytes().to_vec(),
            (PrimitiveType::I16, Value::Int(n)) => (*n as i16).to_le_bytes().to_vec(),
            (PrimitiveType::U32, Value::Int(n)) => (*n as u32).to_le_bytes().to_vec(),
            (PrimitiveType::I32, Value::Int(n)) => (*n as i32).to_le_bytes().to_vec(),
            (PrimitiveType::U64, Value::Int(n)) => (*n as u64).to_le_bytes().to_vec(),
            (PrimitiveType::I64, Value::Int(n)) => (*n as i64).to_le_bytes().to_vec(),
            (PrimitiveType::F32, Value::Float(f)) => (*f as f32).to_le_bytes().to_vec(),
            (PrimitiveType::F64, Value::Float(f)) => f.to_le_bytes().to_vec(),
            (PrimitiveType::Hash256, Value::Hash(h)) => h.0.to_vec(),
            (PrimitiveType::Bool, Value::Bool(b)) => vec![u8::from(*b)],
            (PrimitiveType::Text, Value::Text(s)) => s.as_bytes().to_vec(),
            // is_valid admits no other pairing
            _ => {
                return Err(CatalogError::OutOfDomain {
                    ty: self,
                    value: value.to_string(),
                })
            }
        };

        Ok(Encoded(bytes))
    }

    /// Decode bytes produced by [`serialize`](Self::serialize).
    pub fn deserialize(self, bytes: &[u8]) -> Result<Value, CatalogError> {
        if self.is_fixed_width() && bytes.len() != self.size_in_bytes() {
            return Err(CatalogError::WidthMismatch {
                ty: self,
                expected: self.size_in_bytes(),
                actual: bytes.len(),
            });
        }

        let value = match self {
            PrimitiveType::Char => {
                if !bytes[0].is_ascii() {
                    return Err(CatalogError::InvalidEncoding {
                        ty: self,
                        reason: format!("non-ASCII byte 0x{:02x}", bytes[0]),
                    });
                }
                Value::Char(bytes[0] as char)
            }
            PrimitiveType::U8 => Value::Int(bytes[0] as i128),
            PrimitiveType::I8 => Value::Int(bytes[0] as i8 as i128),
            PrimitiveType::U16 => Value::Int(u16::from_le_bytes(fixed(bytes)) as i128),
            PrimitiveType::I16 => Value::Int(i16::from_le_bytes(fixed(bytes)) as i128),
            PrimitiveType::U32 => Value::Int(u32::from_le_bytes(fixed(bytes)) as i128),
            PrimitiveType::I32 => Value::Int(i32::from_le_bytes(fixed(bytes)) as i128),
            PrimitiveType::U64 => Value::Int(u64::from_le_bytes(fixed(bytes)) as i128),
            PrimitiveType::I64 => Value::Int(i64::from_le_bytes(fixed(bytes)) as i128),
            PrimitiveType::F32 => Value::Float(f32::from_le_bytes(fixed(bytes)) as f64),
            PrimitiveType::F64 => Value::Float(f64::from_le_bytes(fixed(bytes))),
            PrimitiveType::Hash256 => Value::Hash(H256(fixed(bytes))),
            PrimitiveType::Bool => Value::Bool(bytes[0] == 1),
            PrimitiveType::Text => {
                if bytes.len() >= self.size_in_bytes() {
                    return Err(CatalogError::WidthMismatch {
                        ty: self,
                        expected: self.size_in_bytes() - 1,
                        actual: bytes.len(),
                    });
                }
                let text = std::str::from_utf8(bytes).map_err(|e| CatalogError::InvalidEncoding {
                    ty: self,
                    reason: e.to_string(),
                })?;
                Value::Text(text.to_string())
            }
        };

        Ok(value)
    }

    /// Bring a ledger-returned value into encoded-bytes form.
    ///
    /// Native integers are re-encoded at this type's width in little-endian
    /// two's complement, so they follow the same decode path as byte values.
    pub fn normalize(self, raw: &RawValue) -> Result<Vec<u8>, CatalogError> {
        match raw {
            RawValue::Bytes(bytes) => Ok(bytes.clone()),
            RawValue::Hex(s) => {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                hex::decode(digits).map_err(|e| CatalogError::InvalidEncoding {
                    ty: self,
                    reason: e.to_string(),
                })
            }
            RawValue::Int(n) => {
                if !self.is_fixed_width() || self == PrimitiveType::Hash256 {
                    return Err(CatalogError::InvalidEncoding {
                        ty: self,
                        reason: format!("cannot decode native integer {n}"),
                    });
                }

                let width = self.size_in_bytes();
                let bits = 8 * width as u32;
                let min = -(1i128 << (bits - 1));
                let max = (1i128 << bits) - 1;
                if *n < min || *n > max {
                    return Err(CatalogError::OutOfDomain {
                        ty: self,
                        value: n.to_string(),
                    });
                }

                Ok((*n as u128).to_le_bytes()[..width].to_vec())
            }
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Callers check the width first.
fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Hash(h) => write!(f, "{h}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s:?}"),
        }
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Int(n as i128)
            }
        })*
    };
}

int_value!(u8, i8, u16, i16, u32, i32, u64, i64);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(x as f64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<H256> for Value {
    fn from(hash: H256) -> Self {
        Value::Hash(hash)
    }
}

impl Value {
    /// A hash value holding the BLAKE2b-256 digest of `data`.
    pub fn hash_of(data: &[u8]) -> Self {
        Value::Hash(blake2b_256(data))
    }
}

impl Encoded {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Encoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Encoded> for RawValue {
    fn from(encoded: Encoded) -> Self {
        RawValue::Bytes(encoded.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roundtrip(ty: PrimitiveType, value: Value) {
        let encoded = ty.serialize(&value).unwrap();
        if ty.is_fixed_width() {
            assert_eq!(encoded.len(), ty.size_in_bytes(), "{ty} width");
        }
        assert_eq!(ty.deserialize(encoded.as_bytes()).unwrap(), value, "{ty} roundtrip");
    }

    #[test]
    fn test_ids_and_sizes_are_stable() {
        let ids: Vec<u8> = PrimitiveType::ALL.iter().map(|t| t.id()).collect();
        assert_eq!(ids, (0..14).collect::<Vec<u8>>());

        let sizes: Vec<usize> = PrimitiveType::ALL.iter().map(|t| t.size_in_bytes()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2, 2, 4, 4, 8, 8, 4, 8, 32, 1, 128]);
    }

    #[test]
    fn test_from_id() {
        for ty in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_id(ty.id()), Some(ty));
        }
        assert_eq!(PrimitiveType::from_id(14), None);
    }

    #[test]
    fn test_integer_ranges() {
        assert!(PrimitiveType::I8.is_valid(&Value::Int(127)));
        assert!(!PrimitiveType::I8.is_valid(&Value::Int(128)));
        assert!(PrimitiveType::I8.is_valid(&Value::Int(-128)));
        assert!(!PrimitiveType::I8.is_valid(&Value::Int(-129)));
        assert!(!PrimitiveType::U8.is_valid(&Value::Int(256)));
        assert!(!PrimitiveType::U8.is_valid(&Value::Int(-1)));
        assert!(PrimitiveType::U16.is_valid(&Value::Int(65535)));
        assert!(!PrimitiveType::U16.is_valid(&Value::Int(65536)));
        assert!(PrimitiveType::I32.is_valid(&Value::Int(-(1 << 31))));
        assert!(!PrimitiveType::I32.is_valid(&Value::Int(1 << 31)));
        assert!(PrimitiveType::U64.is_valid(&Value::Int(u64::MAX as i128)));
        assert!(!PrimitiveType::I64.is_valid(&Value::Int(u64::MAX as i128)));
    }

    #[test]
    fn test_shape_mismatch_is_invalid() {
        assert!(!PrimitiveType::U32.is_valid(&Value::Text("7".into())));
        assert!(!PrimitiveType::Bool.is_valid(&Value::Int(1)));
        assert!(!PrimitiveType::F64.is_valid(&Value::Int(1)));
    }

    #[test]
    fn test_floats_reject_non_finite() {
        for ty in [PrimitiveType::F32, PrimitiveType::F64] {
            assert!(!ty.is_valid(&Value::Float(f64::NAN)));
            assert!(!ty.is_valid(&Value::Float(f64::INFINITY)));
            assert!(!ty.is_valid(&Value::Float(f64::NEG_INFINITY)));
        }
        assert!(!PrimitiveType::F32.is_valid(&Value::Float(f64::MAX)));
        assert!(PrimitiveType::F64.is_valid(&Value::Float(f64::MAX)));
    }

    #[test]
    fn test_hash_values_compare_by_bytes() {
        let lower: H256 = format!("0x{}", "ab".repeat(32)).parse().unwrap();
        let upper: H256 = format!("0x{}", "AB".repeat(32)).parse().unwrap();
        assert_eq!(Value::from(lower), Value::from(upper));

        roundtrip(PrimitiveType::Hash256, Value::from(upper));
        assert!(!PrimitiveType::Hash256.is_valid(&Value::Text("0xab".into())));
    }

    #[test]
    fn test_hash_of_digests_data() {
        assert_eq!(Value::hash_of(b"abc"), Value::Hash(blake2b_256(b"abc")));
        let encoded = PrimitiveType::Hash256.serialize(&Value::hash_of(b"abc")).unwrap();
        assert_eq!(
            encoded.to_string(),
            "0xbddd813c634239723171ef3fee98579b94964e3bb1cb3e427262c8c068d52319"
        );
    }

    #[test]
    fn test_f32_accepts_only_exact_values() {
        assert!(PrimitiveType::F32.is_valid(&Value::Float(0.5)));
        assert!(PrimitiveType::F32.is_valid(&Value::Float(f32::MAX as f64)));
        assert!(!PrimitiveType::F32.is_valid(&Value::Float(0.1)));
        assert!(PrimitiveType::F64.is_valid(&Value::Float(0.1)));
        roundtrip(PrimitiveType::F32, Value::Float(f32::MIN_POSITIVE as f64));
    }

    #[test]
    fn test_text_bound() {
        assert!(PrimitiveType::Text.is_valid(&Value::Text("a".repeat(127))));
        assert!(!PrimitiveType::Text.is_valid(&Value::Text("a".repeat(128))));
        assert!(matches!(
            PrimitiveType::Text.deserialize(&[b'a'; 128]),
            Err(CatalogError::WidthMismatch { .. })
        ));
    }

    #[test]
    fn test_little_endian_encoding() {
        let encoded = PrimitiveType::U32.serialize(&Value::Int(7)).unwrap();
        assert_eq!(encoded.to_string(), "0x07000000");

        let encoded = PrimitiveType::I16.serialize(&Value::Int(-2)).unwrap();
        assert_eq!(encoded.as_bytes(), &[0xfe, 0xff]);

        let encoded = PrimitiveType::Bool.serialize(&Value::Bool(true)).unwrap();
        assert_eq!(encoded.to_string(), "0x01");
    }

    #[test]
    fn test_serialize_rejects_out_of_domain() {
        let err = PrimitiveType::U8.serialize(&Value::Int(300)).unwrap_err();
        assert!(matches!(err, CatalogError::OutOfDomain { ty: PrimitiveType::U8, .. }));
    }

    #[test]
    fn test_boundary_roundtrips() {
        roundtrip(PrimitiveType::U8, Value::Int(0));
        roundtrip(PrimitiveType::U8, Value::Int(255));
        roundtrip(PrimitiveType::I8, Value::Int(-128));
        roundtrip(PrimitiveType::I8, Value::Int(127));
        roundtrip(PrimitiveType::U16, Value::Int(65535));
        roundtrip(PrimitiveType::I16, Value::Int(i16::MIN as i128));
        roundtrip(PrimitiveType::U32, Value::Int(u32::MAX as i128));
        roundtrip(PrimitiveType::I32, Value::Int(i32::MIN as i128));
        roundtrip(PrimitiveType::U64, Value::Int(u64::MAX as i128));
        roundtrip(PrimitiveType::I64, Value::Int(i64::MIN as i128));
        roundtrip(PrimitiveType::I64, Value::Int(i64::MAX as i128));
        roundtrip(PrimitiveType::F32, Value::Float(1.5));
        roundtrip(PrimitiveType::F64, Value::Float(-2.25e300));
        roundtrip(PrimitiveType::Char, Value::Char('t'));
        roundtrip(PrimitiveType::Bool, Value::Bool(false));
        roundtrip(PrimitiveType::Text, Value::Text("héllo".into()));
        roundtrip(PrimitiveType::Text, Value::Text(String::new()));
        roundtrip(PrimitiveType::Hash256, Value::Hash(H256([0x0f; 32])));
    }

    #[test]
    fn test_bool_decodes_only_one_as_true() {
        assert_eq!(PrimitiveType::Bool.deserialize(&[1]).unwrap(), Value::Bool(true));
        assert_eq!(PrimitiveType::Bool.deserialize(&[0]).unwrap(), Value::Bool(false));
        assert_eq!(PrimitiveType::Bool.deserialize(&[2]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_deserialize_width_mismatch() {
        let err = PrimitiveType::U32.deserialize(&[1, 2]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::WidthMismatch {
                ty: PrimitiveType::U32,
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn test_normalize_native_integers() {
        assert_eq!(PrimitiveType::U32.normalize(&RawValue::Int(7)).unwrap(), vec![7, 0, 0, 0]);
        assert_eq!(PrimitiveType::I8.normalize(&RawValue::Int(-1)).unwrap(), vec![0xff]);
        assert!(PrimitiveType::U8.normalize(&RawValue::Int(256)).is_err());
        assert!(PrimitiveType::Text.normalize(&RawValue::Int(1)).is_err());
        assert!(PrimitiveType::Hash256.normalize(&RawValue::Int(1)).is_err());
    }

    #[test]
    fn test_normalize_hex() {
        assert_eq!(
            PrimitiveType::U16.normalize(&RawValue::Hex("0x0100".into())).unwrap(),
            vec![1, 0]
        );
        assert!(PrimitiveType::U16.normalize(&RawValue::Hex("0xzz".into())).is_err());
    }

    proptest! {
        #[test]
        fn prop_u64_roundtrip(n in any::<u64>()) {
            roundtrip(PrimitiveType::U64, Value::from(n));
        }

        #[test]
        fn prop_i64_roundtrip(n in any::<i64>()) {
            roundtrip(PrimitiveType::I64, Value::from(n));
        }

        #[test]
        fn prop_i32_roundtrip(n in any::<i32>()) {
            roundtrip(PrimitiveType::I32, Value::from(n));
        }

        #[test]
        fn prop_i16_roundtrip(n in any::<i16>()) {
            roundtrip(PrimitiveType::I16, Value::from(n));
        }

        #[test]
        fn prop_f32_roundtrip(x in any::<f32>().prop_filter("finite", |x| x.is_finite())) {
            roundtrip(PrimitiveType::F32, Value::from(x));
        }

        #[test]
        fn prop_f32_valid_implies_roundtrip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
            let value = Value::Float(x);
            if PrimitiveType::F32.is_valid(&value) {
                roundtrip(PrimitiveType::F32, value);
            } else {
                prop_assert!(PrimitiveType::F32.serialize(&value).is_err());
            }
        }

        #[test]
        fn prop_f64_roundtrip(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
            roundtrip(PrimitiveType::F64, Value::from(x));
        }

        #[test]
        fn prop_text_roundtrip(s in "\\PC{0,31}") {
            roundtrip(PrimitiveType::Text, Value::Text(s));
        }

        #[test]
        fn prop_native_int_matches_bytes(n in any::<u32>()) {
            let from_int = PrimitiveType::U32.normalize(&RawValue::Int(n as i128)).unwrap();
            prop_assert_eq!(from_int, n.to_le_bytes().to_vec());
        }
    }
}

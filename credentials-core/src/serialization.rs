//! Canonical CBOR serialization for signing payloads.
//!
//! A submission is signed over the CBOR encoding of its payload, so the
//! encoding must be byte-for-byte reproducible on both sides:
//! 1. Definite-length items only (no major-type additional info 31)
//! 2. Integers in minimal form (ciborium's default)
//! 3. Struct fields in declaration order

use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("CBOR encoding error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    #[error("CBOR decoding error: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),

    #[error("Non-canonical CBOR: {0}")]
    NonCanonical(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serialize a value to canonical CBOR bytes.
pub fn to_canonical_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)?;
    verify_canonical(&buf)?;
    Ok(buf)
}

/// Deserialize a value from canonical CBOR bytes.
pub fn from_canonical_cbor<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    verify_canonical(bytes)?;
    let value = ciborium::from_reader(bytes)?;
    Ok(value)
}

/// Reject indefinite-length items and trailing bytes.
fn verify_canonical(bytes: &[u8]) -> Result<()> {
    let mut cursor = std::io::Cursor::new(bytes);
    verify_item(&mut cursor)?;
    if cursor.position() as usize != bytes.len() {
        return Err(SerializationError::NonCanonical("trailing bytes".to_string()));
    }
    Ok(())
}

fn verify_item<R: Read>(reader: &mut R) -> Result<()> {
    let mut head = [0u8; 1];
    reader.read_exact(&mut head)?;

    let major_type = head[0] >> 5;
    let additional_info = head[0] & 0x1F;

    if additional_info == 31 {
        return Err(SerializationError::NonCanonical(format!(
            "indefinite-length item (major type {major_type})"
        )));
    }

    let argument = match additional_info {
        0..=23 => additional_info as u64,
        24 => read_be::<R, 1>(reader)?,
        25 => read_be::<R, 2>(reader)?,
        26 => read_be::<R, 4>(reader)?,
        27 => read_be::<R, 8>(reader)?,
        other => {
            return Err(SerializationError::NonCanonical(format!(
                "reserved additional info {other}"
            )))
        }
    };

    match major_type {
        // byte / text string: skip content
        2 | 3 => {
            let mut content = vec![0u8; argument as usize];
            reader.read_exact(&mut content)?;
        }
        4 => {
            for _ in 0..argument {
                verify_item(reader)?;
            }
        }
        5 => {
            for _ in 0..argument * 2 {
                verify_item(reader)?;
            }
        }
        6 => verify_item(reader)?,
        _ => {}
    }

    Ok(())
}

fn read_be<R: Read, const N: usize>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

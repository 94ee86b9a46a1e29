//! Record codec: field-name → value maps to and from canonical payloads.

use crate::catalog::{Encoded, RawValue, Value};
use crate::schema::SchemaDefinition;
use std::collections::BTreeMap;
use thiserror::Error;

/// An attestation record: field name → value.
pub type Record = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid value for field {field:?}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Encode a record into one value per schema field, in canonical order.
///
/// Every field must be present and valid for its declared type; fields the
/// schema does not declare are rejected.
pub fn serialize_record(definition: &SchemaDefinition, record: &Record) -> Result<Vec<Encoded>> {
    if let Some(extra) = record.keys().find(|name| definition.field_type(name).is_none()) {
        return Err(CodecError::InvalidValue {
            field: extra.clone(),
            reason: "field is not declared by the schema".to_string(),
        });
    }

    definition
        .canonical_entries()
        .iter()
        .map(|(name, ty)| {
            let value = record.get(name).ok_or_else(|| CodecError::InvalidValue {
                field: name.clone(),
                reason: "missing value".to_string(),
            })?;

            if !ty.is_valid(value) {
                return Err(CodecError::InvalidValue {
                    field: name.clone(),
                    reason: format!("{value} is not a valid {ty}"),
                });
            }

            ty.serialize(value).map_err(|e| CodecError::InvalidValue {
                field: name.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Decode values returned by a ledger query (in canonical order) into a record.
pub fn deserialize_record(definition: &SchemaDefinition, raw_values: &[RawValue]) -> Result<Record> {
    let entries = definition.canonical_entries();
    if raw_values.len() != entries.len() {
        return Err(CodecError::MalformedRecord(format!(
            "expected {} values, got {}",
            entries.len(),
            raw_values.len()
        )));
    }

    entries
        .iter()
        .zip(raw_values)
        .map(|((name, ty), raw)| {
            let bytes = ty
                .normalize(raw)
                .map_err(|e| CodecError::MalformedRecord(format!("field {name:?}: {e}")))?;
            let value = ty
                .deserialize(&bytes)
                .map_err(|e| CodecError::MalformedRecord(format!("field {name:?}: {e}")))?;
            Ok((name.clone(), value))
        })
        .collect()
}

/// Build a [`Record`] from `(name, value)` pairs.
pub fn record<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

//! Schema definitions and their content hash.
//!
//! ## Canonical Order
//! Fields are always visited sorted by name in *descending* order under the
//! Unicode root collation (tertiary strength), the order every existing
//! schema on the ledger was hashed with. Punctuation sorts before digits and
//! digits before letters; letters compare case-insensitively first and only
//! then lowercase before uppercase. Names the collation considers equal fall
//! back to descending byte order. The same order drives the schema hash, the
//! registration payload, and the position of each value in an attestation,
//! so it must not change.
//!
//! ## Schema Hash
//! `blake2b_256(name_0 || id_0 || name_1 || id_1 || ...)` over the canonical
//! entries, where each name is its UTF-8 bytes and each id a single byte.

use crate::catalog::PrimitiveType;
use crate::crypto::blake2b_256;
use crate::types::SchemaHash;
use icu_collator::{Collator, CollatorOptions};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Unknown type id {id} for field {field:?}")]
    UnknownTypeId { field: String, id: u8 },
}

/// An immutable mapping of field names to primitive types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    /// Entries in canonical (descending name) order
    entries: Vec<(String, PrimitiveType)>,
    hash: SchemaHash,
}

impl SchemaDefinition {
    /// Build a definition from `(name, type)` pairs in any order.
    ///
    /// A repeated name keeps its last type, as inserting into a map would.
    pub fn new<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PrimitiveType)>,
        K: Into<String>,
    {
        let unique: BTreeMap<String, PrimitiveType> =
            fields.into_iter().map(|(name, ty)| (name.into(), ty)).collect();
        let mut entries: Vec<(String, PrimitiveType)> = unique.into_iter().collect();
        let order = CanonicalOrder::new();
        entries.sort_by(|(a, _), (b, _)| order.compare(b, a));
        let hash = compute_hash(&entries);

        Self { entries, hash }
    }

    /// Rebuild a definition from a ledger registration record.
    pub fn from_registration(pairs: &[(String, u8)]) -> Result<Self, SchemaError> {
        let fields = pairs
            .iter()
            .map(|(name, id)| {
                PrimitiveType::from_id(*id)
                    .map(|ty| (name.clone(), ty))
                    .ok_or_else(|| SchemaError::UnknownTypeId {
                        field: name.clone(),
                        id: *id,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(fields))
    }

    /// Entries sorted by field name, descending.
    pub fn canonical_entries(&self) -> &[(String, PrimitiveType)] {
        &self.entries
    }

    /// The hash computed at construction.
    pub fn schema_hash(&self) -> SchemaHash {
        self.hash
    }

    /// Recompute the hash from the canonical entries.
    pub fn compute_hash(&self) -> SchemaHash {
        compute_hash(&self.entries)
    }

    /// The create-schema call body: canonical `(name, type id)` pairs.
    pub fn registration_payload(&self) -> Vec<(String, u8)> {
        self.entries
            .iter()
            .map(|(name, ty)| (name.clone(), ty.id()))
            .collect()
    }

    pub fn field_type(&self, name: &str) -> Option<PrimitiveType> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| *ty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, PrimitiveType>> for SchemaDefinition {
    fn from(fields: HashMap<String, PrimitiveType>) -> Self {
        Self::new(fields)
    }
}

impl From<BTreeMap<String, PrimitiveType>> for SchemaDefinition {
    fn from(fields: BTreeMap<String, PrimitiveType>) -> Self {
        Self::new(fields)
    }
}

impl<K: Into<String>> FromIterator<(K, PrimitiveType)> for SchemaDefinition {
    fn from_iter<T: IntoIterator<Item = (K, PrimitiveType)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Field-name comparison underlying canonical order (ascending; canonical
/// order is its reverse).
pub struct CanonicalOrder {
    collator: Option<Collator>,
}

impl CanonicalOrder {
    pub fn new() -> Self {
        // Root collation data is compiled in; loading it does not fail in practice.
        let collator = Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let collated = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => Ordering::Equal,
        };
        collated.then_with(|| a.as_bytes().cmp(b.as_bytes()))
    }
}

impl Default for CanonicalOrder {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_hash(entries: &[(String, PrimitiveType)]) -> SchemaHash {
    let capacity = entries.iter().map(|(name, _)| name.len() + 1).sum();
    let mut buf = Vec::with_capacity(capacity);
    for (name, ty) in entries {
        buf.extend_from_slice(name.as_bytes());
        buf.push(ty.id());
    }
    blake2b_256(&buf)
}

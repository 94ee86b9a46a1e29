//! # Credentials Core
//!
//! Typed, content-addressed schemas for ledger attestations.
//!
//! ## Key Features
//! - **Type catalog**: fourteen primitive field types with fixed ids and widths
//! - **Schema hashing**: BLAKE2b-256 over canonical (descending collated name) fields
//! - **Record codec**: byte-exact little-endian payloads in canonical order
//! - **Signed calls**: canonical CBOR payloads signed with Ed25519

pub mod catalog;
pub mod codec;
pub mod crypto;
pub mod extrinsic;
pub mod schema;
pub mod serialization;
pub mod types;

pub use catalog::{CatalogError, Encoded, PrimitiveType, RawValue, Value};
pub use codec::{deserialize_record, record, serialize_record, CodecError, Record};
pub use crypto::Signer;
pub use extrinsic::{Call, SigningPayload};
pub use schema::{CanonicalOrder, SchemaDefinition, SchemaError};
pub use types::*;

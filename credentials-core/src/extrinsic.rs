//! Ledger calls produced by the credentials and issuer modules.

use crate::catalog::Encoded;
use crate::schema::SchemaDefinition;
use crate::serialization::{to_canonical_cbor, SerializationError};
use crate::types::{AccountAddress, AttestationId, IssuerHash, SchemaHash};
use serde::{Deserialize, Serialize};

/// A single call, submitted alone or as part of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    CreateIssuer {
        name: String,
        controllers: Vec<AccountAddress>,
    },
    EditIssuer {
        issuer: IssuerHash,
        name: String,
        controllers: Vec<AccountAddress>,
    },
    CreateSchema {
        issuer: IssuerHash,
        /// Canonical `(field name, type id)` pairs
        fields: Vec<(String, u8)>,
    },
    Attest {
        issuer: IssuerHash,
        schema: SchemaHash,
        subject: AccountAddress,
        values: Vec<Encoded>,
    },
    UpdateAttestation {
        issuer: IssuerHash,
        schema: SchemaHash,
        subject: AccountAddress,
        attestation_id: AttestationId,
        values: Vec<Encoded>,
    },
}

impl Call {
    pub fn create_schema(issuer: IssuerHash, definition: &SchemaDefinition) -> Self {
        Call::CreateSchema {
            issuer,
            fields: definition.registration_payload(),
        }
    }

    /// `module.call` name, as shown in logs and dispatch errors.
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateIssuer { .. } => "issuers.create_issuer",
            Call::EditIssuer { .. } => "issuers.edit_issuer",
            Call::CreateSchema { .. } => "credentials.create_schema",
            Call::Attest { .. } => "credentials.attest",
            Call::UpdateAttestation { .. } => "credentials.update_attestation",
        }
    }
}

/// What an account signs when it submits one or more calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    pub signer: AccountAddress,
    pub nonce: u64,
    /// More than one call means an atomic batch
    pub calls: Vec<Call>,
}

impl SigningPayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        to_canonical_cbor(self)
    }
}

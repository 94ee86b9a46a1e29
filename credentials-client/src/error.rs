//! Errors surfaced by orchestrator operations.

use crate::ledger::LedgerError;
use credentials_core::{AccountAddress, CodecError, IssuerHash, SchemaError, SchemaHash};
use thiserror::Error;

/// Every orchestrator call either succeeds or fails with exactly one of these.
/// None of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("No issuer bound: create an issuer or set an existing issuer hash first")]
    IssuerNotSet,

    #[error("Issuer {0} does not exist")]
    IssuerNotFound(IssuerHash),

    #[error("Issuer {0} already exists")]
    IssuerAlreadyExists(IssuerHash),

    #[error("Account {account} is not a controller of issuer {issuer}")]
    NotController {
        account: AccountAddress,
        issuer: IssuerHash,
    },

    #[error("Invalid account address {0}")]
    InvalidAddress(AccountAddress),

    #[error("Invalid value for field {field:?}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Schema {0} is not registered")]
    SchemaNotFound(SchemaHash),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

impl From<CodecError> for OrchestratorError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidValue { field, reason } => OrchestratorError::InvalidValue { field, reason },
            CodecError::MalformedRecord(reason) => OrchestratorError::MalformedRecord(reason),
        }
    }
}

impl From<SchemaError> for OrchestratorError {
    fn from(err: SchemaError) -> Self {
        OrchestratorError::MalformedRecord(err.to_string())
    }
}

//! Ledger and signer interfaces consumed by the orchestrator.
//!
//! The orchestrator never talks to a network directly. Everything it needs
//! from the outside world goes through [`LedgerClient`] (queries and
//! submissions) and [`AccountSigner`] (authorizing submissions).

use async_trait::async_trait;
use credentials_core::{
    AccountAddress, AttestationId, Call, IssuerHash, RawValue, SchemaHash, SignatureBytes, H256,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Updates for one submission, in the order the ledger reports them.
pub type SubmissionStream = mpsc::Receiver<SubmissionUpdate>;

/// Query and submission primitives of a ledger.
///
/// Implementations own transport, nonce sequencing and fee handling. Every
/// submission gets its own [`SubmissionStream`], so concurrent callers can
/// share one client.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Whether a schema with this hash has been registered.
    async fn query_schema_exists(&self, hash: &SchemaHash) -> Result<bool, LedgerError>;

    /// The registration record of a schema: canonical `(name, type id)` pairs.
    async fn query_schema(&self, hash: &SchemaHash) -> Result<Option<Vec<(String, u8)>>, LedgerError>;

    async fn query_issuer(&self, hash: &IssuerHash) -> Result<Option<IssuerRecord>, LedgerError>;

    /// Attestations written by `issuer` for `subject` against `schema`.
    async fn query_attestations(
        &self,
        subject: &AccountAddress,
        issuer: &IssuerHash,
        schema: &SchemaHash,
    ) -> Result<Vec<StoredAttestation>, LedgerError>;

    /// Sign and submit a single call.
    async fn submit(&self, call: Call, signer: &dyn AccountSigner) -> Result<SubmissionStream, LedgerError>;

    /// Sign and submit calls as one atomic batch: all take effect or none do.
    async fn submit_batch(
        &self,
        calls: Vec<Call>,
        signer: &dyn AccountSigner,
    ) -> Result<SubmissionStream, LedgerError>;
}

/// Signing capability bound to one ledger account.
pub trait AccountSigner: Send + Sync {
    fn address(&self) -> AccountAddress;

    fn sign(&self, payload: &[u8]) -> SignatureBytes;
}

/// Transport-level failures, as opposed to a submission the ledger rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Signature rejected for {0}")]
    SignatureRejected(AccountAddress),

    #[error("Submission stream closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerRecord {
    pub name: String,
    pub controllers: Vec<AccountAddress>,
}

impl IssuerRecord {
    pub fn is_controller(&self, account: &AccountAddress) -> bool {
        self.controllers.contains(account)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttestation {
    pub id: AttestationId,
    /// Encoded values in canonical schema order
    pub values: Vec<RawValue>,
}

/// A block reference reported with an inclusion status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub number: u64,
    pub hash: H256,
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.number, self.hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Accepted into the pool
    Ready,
    InBlock(BlockRef),
    Finalized(BlockRef),
    /// Dropped, invalid, or usurped before inclusion
    Dropped(String),
}

impl TxStatus {
    /// The block this status reports inclusion in, if any.
    pub fn included_in(&self) -> Option<BlockRef> {
        match self {
            TxStatus::InBlock(block) | TxStatus::Finalized(block) => Some(*block),
            _ => None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, TxStatus::Finalized(_))
    }
}

/// The ledger's decoded reason for a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchError {
    /// Module (pallet) that raised the error, when the ledger decodes it
    pub module: Option<String>,
    pub reason: String,
}

impl DispatchError {
    pub fn module(module: &str, reason: &str) -> Self {
        Self {
            module: Some(module.to_string()),
            reason: reason.to_string(),
        }
    }

    pub fn other(reason: &str) -> Self {
        Self {
            module: None,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}.{}", module, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    IssuerCreated(IssuerHash),
    IssuerEdited { old: IssuerHash, new: IssuerHash },
    SchemaCreated(SchemaHash),
    AttestationCreated {
        issuer: IssuerHash,
        schema: SchemaHash,
        subject: AccountAddress,
        id: AttestationId,
    },
    AttestationUpdated {
        issuer: IssuerHash,
        schema: SchemaHash,
        subject: AccountAddress,
        id: AttestationId,
    },
    ExtrinsicSuccess,
    ExtrinsicFailed(DispatchError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionUpdate {
    pub status: TxStatus,
    pub events: Vec<LedgerEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        assert_eq!(
            DispatchError::module("credentials", "SchemaAlreadyExists").to_string(),
            "credentials.SchemaAlreadyExists"
        );
        assert_eq!(DispatchError::other("BadOrigin").to_string(), "BadOrigin");
    }

    #[test]
    fn test_status_inclusion() {
        let block = BlockRef { number: 3, hash: H256::zero() };
        assert_eq!(TxStatus::Ready.included_in(), None);
        assert_eq!(TxStatus::InBlock(block).included_in(), Some(block));
        assert!(TxStatus::Finalized(block).is_finalized());
        assert!(!TxStatus::InBlock(block).is_finalized());
    }

    #[test]
    fn test_issuer_controllers() {
        let issuer = IssuerRecord {
            name: "acme".to_string(),
            controllers: vec![AccountAddress::from("0xaa")],
        };
        assert!(issuer.is_controller(&AccountAddress::from("0xaa")));
        assert!(!issuer.is_controller(&AccountAddress::from("0xbb")));
    }
}

//! Attestation client for a credentials ledger.
//!
//! This crate drives schema registration and attestation writes against a
//! ledger that exposes issuer and credential calls.
//!
//! ## Attestation Flow
//! 1. Bind an issuer (create one, or set an existing issuer hash)
//! 2. Serialize the record against its schema, locally
//! 3. Check the signer controls the issuer
//! 4. Check whether the schema is registered
//! 5. Submit the attestation, batched with schema registration if needed
//! 6. Wait for the confirming event in an included block
//!
//! The ledger is reached through [`LedgerClient`]; [`MemoryLedger`] is an
//! in-process implementation for tests and demos.

pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod orchestrator;
pub mod plan;
pub mod signer;
mod watch;

pub use config::{ClientConfig, NetworkConfig};
pub use error::{OrchestratorError, Result};
pub use ledger::{
    AccountSigner, BlockRef, DispatchError, IssuerRecord, LedgerClient, LedgerError, LedgerEvent,
    StoredAttestation, SubmissionStream, SubmissionUpdate, TxStatus,
};
pub use memory::MemoryLedger;
pub use orchestrator::{AttestationOrchestrator, AttestationReceipt};
pub use plan::{OperationState, SubmissionPlan};
pub use signer::KeypairSigner;

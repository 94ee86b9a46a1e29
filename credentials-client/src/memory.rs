//! In-process ledger implementing [`LedgerClient`].
//!
//! Applies issuer and credential calls to in-memory state, one block per
//! submission. Batches are all-or-nothing. Each submission's signature is
//! checked against the signer's address over the canonical CBOR
//! [`SigningPayload`]. Every submission is recorded so tests can assert on
//! exactly what was sent.

use crate::ledger::{
    AccountSigner, BlockRef, DispatchError, IssuerRecord, LedgerClient, LedgerError, LedgerEvent,
    StoredAttestation, SubmissionStream, SubmissionUpdate, TxStatus,
};
use async_trait::async_trait;
use credentials_core::crypto::{blake2b_256, issuer_hash, verify};
use credentials_core::{
    AccountAddress, AttestationId, Call, Encoded, IssuerHash, PrimitiveType, RawValue, SchemaDefinition,
    SchemaHash, SigningPayload,
};
use std::collections::{HashMap, VecDeque};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

const ISSUERS: &str = "issuers";
const CREDENTIALS: &str = "credentials";

/// First id handed out to an attestation.
pub const FIRST_ATTESTATION_ID: AttestationId = 100;

/// A submission as the ledger received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub signer: AccountAddress,
    pub nonce: u64,
    pub calls: Vec<Call>,
    pub batched: bool,
}

type AttestationKey = (AccountAddress, IssuerHash, SchemaHash);

#[derive(Debug, Clone)]
struct LedgerState {
    issuers: HashMap<IssuerHash, IssuerRecord>,
    schemas: HashMap<SchemaHash, Vec<(String, u8)>>,
    attestations: HashMap<AttestationKey, Vec<StoredAttestation>>,
    next_attestation_id: AttestationId,
    nonces: HashMap<AccountAddress, u64>,
    block_number: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            issuers: HashMap::new(),
            schemas: HashMap::new(),
            attestations: HashMap::new(),
            next_attestation_id: FIRST_ATTESTATION_ID,
            nonces: HashMap::new(),
            block_number: 0,
        }
    }
}

enum Fault {
    Fail(DispatchError),
    Drop(String),
}

/// In-memory ledger for tests and demos.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    submissions: Mutex<Vec<SubmissionRecord>>,
    faults: Mutex<VecDeque<Fault>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next submission fail dispatch with `error`, changing nothing.
    pub async fn fail_next(&self, error: DispatchError) {
        self.faults.lock().await.push_back(Fault::Fail(error));
    }

    /// Make the next submission be dropped from the pool before inclusion.
    pub async fn drop_next(&self, reason: &str) {
        self.faults.lock().await.push_back(Fault::Drop(reason.to_string()));
    }

    /// Every submission received so far, in order.
    pub async fn submissions(&self) -> Vec<SubmissionRecord> {
        self.submissions.lock().await.clone()
    }

    pub async fn block_number(&self) -> u64 {
        self.state.lock().await.block_number
    }

    async fn submit_calls(
        &self,
        calls: Vec<Call>,
        batched: bool,
        signer: &dyn AccountSigner,
    ) -> Result<SubmissionStream, LedgerError> {
        let origin = signer.address();
        let mut state = self.state.lock().await;

        let nonce = state.nonces.get(&origin).copied().unwrap_or(0);
        let payload = SigningPayload {
            signer: origin.clone(),
            nonce,
            calls,
        };
        let bytes = payload
            .to_bytes()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let signature = signer.sign(&bytes);
        if !verify(&origin, &bytes, &signature) {
            return Err(LedgerError::SignatureRejected(origin));
        }

        self.submissions.lock().await.push(SubmissionRecord {
            signer: origin.clone(),
            nonce,
            calls: payload.calls.clone(),
            batched,
        });
        state.nonces.insert(origin.clone(), nonce + 1);

        let (tx, rx) = mpsc::channel(4);
        let ready = SubmissionUpdate {
            status: TxStatus::Ready,
            events: Vec::new(),
        };

        let events = match self.faults.lock().await.pop_front() {
            Some(Fault::Drop(reason)) => {
                send_all(&tx, vec![ready, SubmissionUpdate {
                    status: TxStatus::Dropped(reason),
                    events: Vec::new(),
                }]);
                return Ok(rx);
            }
            Some(Fault::Fail(error)) => vec![LedgerEvent::ExtrinsicFailed(error)],
            None => apply_all(&mut state, &origin, &payload.calls),
        };

        state.block_number += 1;
        let mut preimage = state.block_number.to_le_bytes().to_vec();
        preimage.extend_from_slice(&bytes);
        let block = BlockRef {
            number: state.block_number,
            hash: blake2b_256(&preimage),
        };
        debug!(block = %block, calls = payload.calls.len(), batched, "block produced");

        send_all(&tx, vec![
            ready,
            SubmissionUpdate {
                status: TxStatus::InBlock(block),
                events,
            },
            SubmissionUpdate {
                status: TxStatus::Finalized(block),
                events: Vec::new(),
            },
        ]);

        Ok(rx)
    }
}

fn send_all(tx: &mpsc::Sender<SubmissionUpdate>, updates: Vec<SubmissionUpdate>) {
    for update in updates {
        // Capacity covers every update of one submission; a closed receiver
        // only means the caller stopped watching.
        let _ = tx.try_send(update);
    }
}

/// Apply calls atomically: on the first dispatch error nothing is kept.
fn apply_all(state: &mut LedgerState, origin: &AccountAddress, calls: &[Call]) -> Vec<LedgerEvent> {
    let mut scratch = state.clone();
    let mut events = Vec::new();

    for call in calls {
        match apply(&mut scratch, origin, call) {
            Ok(event) => events.push(event),
            Err(error) => {
                debug!(call = call.name(), error = %error, "dispatch failed");
                return vec![LedgerEvent::ExtrinsicFailed(error)];
            }
        }
    }

    *state = scratch;
    events.push(LedgerEvent::ExtrinsicSuccess);
    events
}

fn apply(state: &mut LedgerState, origin: &AccountAddress, call: &Call) -> Result<LedgerEvent, DispatchError> {
    match call {
        Call::CreateIssuer { name, controllers } => {
            let hash = issuer_hash(name);
            if state.issuers.contains_key(&hash) {
                return Err(DispatchError::module(ISSUERS, "IssuerAlreadyExists"));
            }
            state.issuers.insert(hash, IssuerRecord {
                name: name.clone(),
                controllers: controllers.clone(),
            });
            Ok(LedgerEvent::IssuerCreated(hash))
        }
        Call::EditIssuer { issuer, name, controllers } => {
            authorize(state, issuer, origin, ISSUERS)?;
            let new = issuer_hash(name);
            if new != *issuer && state.issuers.contains_key(&new) {
                return Err(DispatchError::module(ISSUERS, "IssuerAlreadyExists"));
            }
            state.issuers.remove(issuer);
            state.issuers.insert(new, IssuerRecord {
                name: name.clone(),
                controllers: controllers.clone(),
            });
            Ok(LedgerEvent::IssuerEdited { old: *issuer, new })
        }
        Call::CreateSchema { issuer, fields } => {
            authorize(state, issuer, origin, CREDENTIALS)?;
            let definition = SchemaDefinition::from_registration(fields)
                .map_err(|_| DispatchError::module(CREDENTIALS, "InvalidSchemaType"))?;
            let hash = definition.schema_hash();
            if state.schemas.contains_key(&hash) {
                return Err(DispatchError::module(CREDENTIALS, "SchemaAlreadyExists"));
            }
            state.schemas.insert(hash, definition.registration_payload());
            Ok(LedgerEvent::SchemaCreated(hash))
        }
        Call::Attest { issuer, schema, subject, values } => {
            authorize(state, issuer, origin, CREDENTIALS)?;
            check_values(state, schema, values)?;

            let id = state.next_attestation_id;
            state.next_attestation_id += 1;
            state
                .attestations
                .entry((subject.clone(), *issuer, *schema))
                .or_default()
                .push(StoredAttestation {
                    id,
                    values: values.iter().cloned().map(RawValue::from).collect(),
                });

            Ok(LedgerEvent::AttestationCreated {
                issuer: *issuer,
                schema: *schema,
                subject: subject.clone(),
                id,
            })
        }
        Call::UpdateAttestation { issuer, schema, subject, attestation_id, values } => {
            authorize(state, issuer, origin, CREDENTIALS)?;
            check_values(state, schema, values)?;

            let stored = state
                .attestations
                .get_mut(&(subject.clone(), *issuer, *schema))
                .and_then(|list| list.iter_mut().find(|a| a.id == *attestation_id))
                .ok_or_else(|| DispatchError::module(CREDENTIALS, "AttestationNotFound"))?;
            stored.values = values.iter().cloned().map(RawValue::from).collect();

            Ok(LedgerEvent::AttestationUpdated {
                issuer: *issuer,
                schema: *schema,
                subject: subject.clone(),
                id: *attestation_id,
            })
        }
    }
}

fn authorize(
    state: &LedgerState,
    issuer: &IssuerHash,
    origin: &AccountAddress,
    module: &str,
) -> Result<(), DispatchError> {
    let record = state
        .issuers
        .get(issuer)
        .ok_or_else(|| DispatchError::module(module, "IssuerNotFound"))?;
    if !record.is_controller(origin) {
        return Err(DispatchError::module(module, "NotController"));
    }
    Ok(())
}

/// Values must match the registered fields in count and encoded width.
fn check_values(state: &LedgerState, schema: &SchemaHash, values: &[Encoded]) -> Result<(), DispatchError> {
    let fields = state
        .schemas
        .get(schema)
        .ok_or_else(|| DispatchError::module(CREDENTIALS, "SchemaNotFound"))?;
    if fields.len() != values.len() {
        return Err(DispatchError::module(CREDENTIALS, "AttestationLengthMismatch"));
    }

    for ((_, id), value) in fields.iter().zip(values) {
        let ty = PrimitiveType::from_id(*id)
            .ok_or_else(|| DispatchError::module(CREDENTIALS, "InvalidSchemaType"))?;
        let fits = if ty.is_fixed_width() {
            value.len() == ty.size_in_bytes()
        } else {
            value.len() < ty.size_in_bytes()
        };
        if !fits {
            return Err(DispatchError::module(CREDENTIALS, "AttestationSizeMismatch"));
        }
    }
    Ok(())
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn query_schema_exists(&self, hash: &SchemaHash) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.schemas.contains_key(hash))
    }

    async fn query_schema(&self, hash: &SchemaHash) -> Result<Option<Vec<(String, u8)>>, LedgerError> {
        Ok(self.state.lock().await.schemas.get(hash).cloned())
    }

    async fn query_issuer(&self, hash: &IssuerHash) -> Result<Option<IssuerRecord>, LedgerError> {
        Ok(self.state.lock().await.issuers.get(hash).cloned())
    }

    async fn query_attestations(
        &self,
        subject: &AccountAddress,
        issuer: &IssuerHash,
        schema: &SchemaHash,
    ) -> Result<Vec<StoredAttestation>, LedgerError> {
        let state = self.state.lock().await;
        let key = (subject.clone(), *issuer, *schema);
        Ok(state.attestations.get(&key).cloned().unwrap_or_default())
    }

    async fn submit(&self, call: Call, signer: &dyn AccountSigner) -> Result<SubmissionStream, LedgerError> {
        self.submit_calls(vec![call], false, signer).await
    }

    async fn submit_batch(
        &self,
        calls: Vec<Call>,
        signer: &dyn AccountSigner,
    ) -> Result<SubmissionStream, LedgerError> {
        self.submit_calls(calls, true, signer).await
    }
}

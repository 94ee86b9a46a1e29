//! Attestation orchestrator: register schemas, write and update attestations.
//!
//! ## Call Sequence
//! 1. Local validation (issuer bound, subject address, record serializes)
//!    before any network call
//! 2. Authorization check against the issuer's controller set
//! 3. Schema existence check
//! 4. One submission: the mutation alone, or `[create_schema, mutation]` as
//!    an atomic batch when the schema is new
//! 5. Wait for the confirming event in an included block
//!
//! The existence check and the submission are separate round-trips. Two
//! callers racing on a never-seen schema can both submit a create-schema; the
//! ledger rejects the second, and that caller gets `TransactionFailed`.

use crate::config::ClientConfig;
use crate::error::{OrchestratorError, Result};
use crate::ledger::{AccountSigner, BlockRef, IssuerRecord, LedgerClient, LedgerEvent, SubmissionStream};
use crate::plan::{OperationState, Progress, SubmissionPlan};
use crate::watch::{watch_submission, Confirmed};
use chrono::{DateTime, Utc};
use credentials_core::crypto::{issuer_hash, key_from_address};
use credentials_core::{
    deserialize_record, serialize_record, AccountAddress, AttestationId, Call, IssuerHash, Record,
    SchemaDefinition, SchemaHash,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Outcome of a successful attest or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationReceipt {
    pub attestation_id: AttestationId,
    pub issuer: IssuerHash,
    pub schema: SchemaHash,
    pub subject: AccountAddress,
    pub block: BlockRef,
    /// Whether the schema was registered in the same batch
    pub registered_schema: bool,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Attest,
    Update(AttestationId),
}

impl Mutation {
    fn operation(self) -> &'static str {
        match self {
            Mutation::Attest => "attest",
            Mutation::Update(_) => "update",
        }
    }

    fn working_state(self) -> OperationState {
        match self {
            Mutation::Attest => OperationState::Attesting,
            Mutation::Update(_) => OperationState::Updating,
        }
    }
}

/// Coordinates schema registration and attestation writes for one account.
///
/// Cheap to share behind an `Arc`: all methods take `&self`, and concurrent
/// calls each track their own submission.
pub struct AttestationOrchestrator {
    ledger: Arc<dyn LedgerClient>,
    signer: Arc<dyn AccountSigner>,
    config: ClientConfig,
    issuer: RwLock<Option<IssuerHash>>,
}

impl AttestationOrchestrator {
    pub fn new(ledger: Arc<dyn LedgerClient>, signer: Arc<dyn AccountSigner>, config: ClientConfig) -> Self {
        let issuer = RwLock::new(config.issuer);
        Self {
            ledger,
            signer,
            config,
            issuer,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The account submissions are signed with.
    pub fn account(&self) -> AccountAddress {
        self.signer.address()
    }

    /// The issuer this orchestrator acts for, if bound.
    pub async fn issuer(&self) -> Option<IssuerHash> {
        *self.issuer.read().await
    }

    /// Act for an issuer that already exists on the ledger.
    pub async fn set_issuer(&self, issuer: IssuerHash) {
        *self.issuer.write().await = Some(issuer);
    }

    async fn bound_issuer(&self) -> Result<IssuerHash> {
        self.issuer().await.ok_or(OrchestratorError::IssuerNotSet)
    }

    /// Fetch an issuer's record.
    pub async fn get_issuer(&self, issuer: &IssuerHash) -> Result<IssuerRecord> {
        self.ledger
            .query_issuer(issuer)
            .await?
            .ok_or(OrchestratorError::IssuerNotFound(*issuer))
    }

    /// Check that the issuer exists and our account controls it.
    async fn authorize(&self, issuer: &IssuerHash) -> Result<IssuerRecord> {
        let record = self.get_issuer(issuer).await?;
        let account = self.account();
        if !record.is_controller(&account) {
            return Err(OrchestratorError::NotController {
                account,
                issuer: *issuer,
            });
        }
        Ok(record)
    }

    pub async fn schema_exists(&self, definition: &SchemaDefinition) -> Result<bool> {
        let exists = self.ledger.query_schema_exists(&definition.schema_hash()).await?;
        debug!(schema = %definition.schema_hash(), exists, "schema existence checked");
        Ok(exists)
    }

    /// Register a new issuer controlled by `controllers` and act for it.
    pub async fn create_issuer(&self, name: &str, controllers: Vec<AccountAddress>) -> Result<IssuerHash> {
        controllers.iter().try_for_each(check_address)?;
        let hash = issuer_hash(name);
        if self.ledger.query_issuer(&hash).await?.is_some() {
            return Err(OrchestratorError::IssuerAlreadyExists(hash));
        }

        let call = Call::CreateIssuer {
            name: name.to_string(),
            controllers,
        };
        let stream = self.submit(SubmissionPlan::Solo(call)).await?;
        let confirmed = self
            .watch("issuers.create_issuer", stream, |event| match event {
                LedgerEvent::IssuerCreated(created) if *created == hash => Some(*created),
                _ => None,
            })
            .await?;

        info!(issuer = %hash, block = %confirmed.block, "issuer created");
        self.set_issuer(hash).await;
        Ok(hash)
    }

    /// Rename the bound issuer and replace its controllers.
    ///
    /// The issuer's identity is the hash of its name, so a rename rebinds this
    /// orchestrator to the new hash.
    pub async fn edit_issuer(&self, name: &str, controllers: Vec<AccountAddress>) -> Result<IssuerHash> {
        let current = self.bound_issuer().await?;
        controllers.iter().try_for_each(check_address)?;
        self.authorize(&current).await?;

        let new = issuer_hash(name);
        if new != current && self.ledger.query_issuer(&new).await?.is_some() {
            return Err(OrchestratorError::IssuerAlreadyExists(new));
        }

        let call = Call::EditIssuer {
            issuer: current,
            name: name.to_string(),
            controllers,
        };
        let stream = self.submit(SubmissionPlan::Solo(call)).await?;
        self.watch("issuers.edit_issuer", stream, |event| match event {
            LedgerEvent::IssuerEdited { old, new: edited } if *old == current && *edited == new => Some(()),
            _ => None,
        })
        .await?;

        info!(old = %current, new = %new, "issuer edited");
        self.set_issuer(new).await;
        Ok(new)
    }

    /// Register a schema unless it already exists. Returns its hash either way.
    pub async fn register(&self, definition: &SchemaDefinition) -> Result<SchemaHash> {
        let issuer = self.bound_issuer().await?;
        let hash = definition.schema_hash();

        if self.schema_exists(definition).await? {
            debug!(schema = %hash, "schema already registered");
            return Ok(hash);
        }

        let mut progress = Progress::new("register", OperationState::Unregistered);
        let result = async {
            self.authorize(&issuer).await?;

            progress.advance(OperationState::Registering);
            let call = Call::create_schema(issuer, definition);
            let stream = self.submit(SubmissionPlan::Solo(call)).await?;
            self.watch("credentials.create_schema", stream, |event| match event {
                LedgerEvent::SchemaCreated(created) if *created == hash => Some(*created),
                _ => None,
            })
            .await
        }
        .await;

        match result {
            Ok(confirmed) => {
                progress.advance(OperationState::Registered);
                info!(schema = %hash, issuer = %issuer, block = %confirmed.block, "schema registered");
                Ok(hash)
            }
            Err(err) => {
                progress.fail(&err);
                Err(err)
            }
        }
    }

    /// Write a new attestation for `subject`, registering the schema in the
    /// same atomic batch if needed.
    pub async fn attest(
        &self,
        definition: &SchemaDefinition,
        subject: &AccountAddress,
        record: &Record,
    ) -> Result<AttestationReceipt> {
        self.mutate(Mutation::Attest, definition, subject, record).await
    }

    /// Replace the values of attestation `attestation_id` in place.
    pub async fn update(
        &self,
        definition: &SchemaDefinition,
        subject: &AccountAddress,
        attestation_id: AttestationId,
        record: &Record,
    ) -> Result<AttestationReceipt> {
        self.mutate(Mutation::Update(attestation_id), definition, subject, record)
            .await
    }

    async fn mutate(
        &self,
        mutation: Mutation,
        definition: &SchemaDefinition,
        subject: &AccountAddress,
        record: &Record,
    ) -> Result<AttestationReceipt> {
        let issuer = self.bound_issuer().await?;
        let schema = definition.schema_hash();
        check_address(subject)?;
        let values = serialize_record(definition, record)?;

        self.authorize(&issuer).await?;
        let exists = self.schema_exists(definition).await?;

        let call = match mutation {
            Mutation::Attest => Call::Attest {
                issuer,
                schema,
                subject: subject.clone(),
                values,
            },
            Mutation::Update(attestation_id) => Call::UpdateAttestation {
                issuer,
                schema,
                subject: subject.clone(),
                attestation_id,
                values,
            },
        };
        let plan = SubmissionPlan::for_mutation(exists, issuer, definition, call);
        let batched = plan.is_batched();
        let label = plan.mutation().name();

        let mut progress = Progress::new(mutation.operation(), OperationState::initial(exists));
        progress.advance(if batched {
            OperationState::Registering
        } else {
            mutation.working_state()
        });

        let result = async {
            let stream = self.submit(plan).await?;
            self.watch(label, stream, |event| match (event, mutation) {
                (
                    LedgerEvent::AttestationCreated { issuer: i, schema: s, subject: who, id },
                    Mutation::Attest,
                ) if *i == issuer && *s == schema && who == subject => Some(*id),
                (
                    LedgerEvent::AttestationUpdated { issuer: i, schema: s, subject: who, id },
                    Mutation::Update(expected),
                ) if *i == issuer && *s == schema && who == subject && *id == expected => Some(*id),
                _ => None,
            })
            .await
        }
        .await;

        let confirmed = match result {
            Ok(confirmed) => confirmed,
            Err(err) => {
                progress.fail(&err);
                return Err(err);
            }
        };

        if batched {
            progress.advance(OperationState::Registered);
            progress.advance(mutation.working_state());
        }
        progress.advance(OperationState::Attested);
        debug!(state = %progress.state(), "operation finished");

        info!(
            schema = %schema,
            subject = %subject,
            attestation_id = confirmed.value,
            batched,
            block = %confirmed.block,
            "attestation {}",
            if mutation == Mutation::Attest { "created" } else { "updated" }
        );

        Ok(AttestationReceipt {
            attestation_id: confirmed.value,
            issuer,
            schema,
            subject: subject.clone(),
            block: confirmed.block,
            registered_schema: batched,
            confirmed_at: Utc::now(),
        })
    }

    /// All attestations the bound issuer has written for `subject` under this schema.
    pub async fn get_attestations(
        &self,
        definition: &SchemaDefinition,
        subject: &AccountAddress,
    ) -> Result<Vec<(AttestationId, Record)>> {
        let issuer = self.bound_issuer().await?;
        let schema = definition.schema_hash();
        check_address(subject)?;
        if !self.schema_exists(definition).await? {
            return Err(OrchestratorError::SchemaNotFound(schema));
        }

        let stored = self.ledger.query_attestations(subject, &issuer, &schema).await?;
        stored
            .into_iter()
            .map(|attestation| -> Result<(AttestationId, Record)> {
                let record = deserialize_record(definition, &attestation.values)?;
                Ok((attestation.id, record))
            })
            .collect()
    }

    /// Rebuild a registered schema's definition from the ledger.
    pub async fn get_schema(&self, hash: &SchemaHash) -> Result<SchemaDefinition> {
        let pairs = self
            .ledger
            .query_schema(hash)
            .await?
            .ok_or(OrchestratorError::SchemaNotFound(*hash))?;
        let definition = SchemaDefinition::from_registration(&pairs)?;

        if definition.schema_hash() != *hash {
            return Err(OrchestratorError::MalformedRecord(format!(
                "registration record for {hash} hashes to {}",
                definition.schema_hash()
            )));
        }
        Ok(definition)
    }

    async fn submit(&self, plan: SubmissionPlan) -> Result<SubmissionStream> {
        let signer = self.signer.as_ref();
        let stream = match plan {
            SubmissionPlan::Solo(call) => {
                info!(call = call.name(), account = %signer.address(), "submitting");
                self.ledger.submit(call, signer).await?
            }
            SubmissionPlan::Batched(create, call) => {
                info!(call = call.name(), account = %signer.address(), "submitting batch with schema registration");
                self.ledger.submit_batch(vec![create, call], signer).await?
            }
        };
        Ok(stream)
    }

    async fn watch<T, F>(&self, label: &str, stream: SubmissionStream, confirm: F) -> Result<Confirmed<T>>
    where
        F: FnMut(&LedgerEvent) -> Option<T>,
    {
        watch_submission(label, stream, self.config.wait_for_finalization, confirm).await
    }
}

/// Accounts are `0x` followed by a hex Ed25519 public key.
fn check_address(address: &AccountAddress) -> Result<()> {
    match key_from_address(address) {
        Some(_) => Ok(()),
        None => Err(OrchestratorError::InvalidAddress(address.clone())),
    }
}

impl fmt::Debug for AttestationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationOrchestrator")
            .field("account", &self.account())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DispatchError, LedgerError, StoredAttestation};
    use crate::memory::{MemoryLedger, FIRST_ATTESTATION_ID};
    use crate::signer::KeypairSigner;
    use async_trait::async_trait;
    use credentials_core::{record, PrimitiveType, Value, H256};

    struct Fixture {
        ledger: Arc<MemoryLedger>,
        orchestrator: AttestationOrchestrator,
    }

    async fn fixture() -> Fixture {
        fixture_with(ClientConfig::default()).await
    }

    async fn fixture_with(config: ClientConfig) -> Fixture {
        let ledger = Arc::new(MemoryLedger::new());
        let signer = Arc::new(KeypairSigner::generate());
        let orchestrator = AttestationOrchestrator::new(ledger.clone(), signer.clone(), config);
        orchestrator
            .create_issuer("acme", vec![signer.address()])
            .await
            .unwrap();
        Fixture { ledger, orchestrator }
    }

    fn count_flag() -> SchemaDefinition {
        SchemaDefinition::new([("count", PrimitiveType::U32), ("flag", PrimitiveType::Bool)])
    }

    fn count_flag_record(count: u32, flag: bool) -> Record {
        record([("count", Value::from(count)), ("flag", Value::from(flag))])
    }

    fn subject() -> AccountAddress {
        KeypairSigner::from_seed([0xbb; 32]).address()
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let Fixture { ledger, orchestrator } = fixture().await;

        let hash = orchestrator.register(&count_flag()).await.unwrap();
        assert_eq!(hash, count_flag().schema_hash());
        assert_eq!(ledger.submissions().await.len(), 2);

        let again = orchestrator.register(&count_flag()).await.unwrap();
        assert_eq!(again, hash);
        assert_eq!(ledger.submissions().await.len(), 2, "no submission for an existing schema");
    }

    #[tokio::test]
    async fn test_register_requires_issuer() {
        let ledger = Arc::new(MemoryLedger::new());
        let orchestrator = AttestationOrchestrator::new(
            ledger.clone(),
            Arc::new(KeypairSigner::generate()),
            ClientConfig::default(),
        );

        let err = orchestrator.register(&count_flag()).await.unwrap_err();
        assert_eq!(err, OrchestratorError::IssuerNotSet);
        assert!(ledger.submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_attest_new_schema_submits_one_batch() {
        let Fixture { ledger, orchestrator } = fixture().await;
        let schema = count_flag();

        let receipt = orchestrator
            .attest(&schema, &subject(), &count_flag_record(7, true))
            .await
            .unwrap();
        assert_eq!(receipt.attestation_id, FIRST_ATTESTATION_ID);
        assert!(receipt.registered_schema);

        let submissions = ledger.submissions().await;
        assert_eq!(submissions.len(), 2);
        let batch = &submissions[1];
        assert!(batch.batched);
        assert_eq!(batch.calls.len(), 2);
        assert_eq!(batch.calls[0], Call::create_schema(receipt.issuer, &schema));
        assert!(matches!(batch.calls[1], Call::Attest { .. }));
    }

    #[tokio::test]
    async fn test_attest_existing_schema_submits_plain_attest() {
        let Fixture { ledger, orchestrator } = fixture().await;
        let schema = count_flag();
        orchestrator.register(&schema).await.unwrap();

        let receipt = orchestrator
            .attest(&schema, &subject(), &count_flag_record(7, true))
            .await
            .unwrap();
        assert!(!receipt.registered_schema);

        let submissions = ledger.submissions().await;
        assert_eq!(submissions.len(), 3);
        let last = &submissions[2];
        assert!(!last.batched);
        match &last.calls[..] {
            [Call::Attest { values, subject: who, .. }] => {
                let wire: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                assert_eq!(wire, vec!["0x01", "0x07000000"]);
                assert_eq!(who, &subject());
            }
            other => panic!("unexpected calls: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_value_fails_before_submission() {
        let Fixture { ledger, orchestrator } = fixture().await;
        let bad = record([("count", Value::Int(-1)), ("flag", Value::Bool(true))]);

        let err = orchestrator.attest(&count_flag(), &subject(), &bad).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidValue { ref field, .. } if field == "count"));
        assert_eq!(ledger.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_extrinsic_failed_rejects_and_leaves_nothing() {
        let Fixture { ledger, orchestrator } = fixture().await;
        ledger
            .fail_next(DispatchError::module("credentials", "InsufficientBalance"))
            .await;

        let err = orchestrator
            .attest(&count_flag(), &subject(), &count_flag_record(1, false))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::TransactionFailed(
                "credentials.attest: credentials.InsufficientBalance".to_string()
            )
        );
        assert!(!orchestrator.schema_exists(&count_flag()).await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_submission_fails() {
        let Fixture { ledger, orchestrator } = fixture().await;
        ledger.drop_next("usurped").await;

        let err = orchestrator.register(&count_flag()).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::TransactionFailed(ref msg) if msg.contains("usurped")));
    }

    #[tokio::test]
    async fn test_not_controller() {
        let Fixture { ledger, orchestrator } = fixture().await;
        let issuer = orchestrator.issuer().await.unwrap();

        let stranger = AttestationOrchestrator::new(
            ledger.clone(),
            Arc::new(KeypairSigner::generate()),
            ClientConfig::default().with_issuer(issuer),
        );
        let err = stranger
            .attest(&count_flag(), &subject(), &count_flag_record(1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotController { .. }));
        assert_eq!(ledger.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_issuer() {
        let Fixture { orchestrator, .. } = fixture().await;
        orchestrator.set_issuer(H256([0xee; 32])).await;

        let err = orchestrator
            .attest(&count_flag(), &subject(), &count_flag_record(1, true))
            .await
            .unwrap_err();
        assert_eq!(err, OrchestratorError::IssuerNotFound(H256([0xee; 32])));
    }

    #[tokio::test]
    async fn test_update_replaces_values() {
        let Fixture { orchestrator, .. } = fixture().await;
        let schema = count_flag();
        let created = orchestrator
            .attest(&schema, &subject(), &count_flag_record(7, true))
            .await
            .unwrap();

        let updated = orchestrator
            .update(&schema, &subject(), created.attestation_id, &count_flag_record(8, false))
            .await
            .unwrap();
        assert_eq!(updated.attestation_id, created.attestation_id);
        assert!(!updated.registered_schema);

        let stored = orchestrator.get_attestations(&schema, &subject()).await.unwrap();
        assert_eq!(stored, vec![(created.attestation_id, count_flag_record(8, false))]);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let Fixture { orchestrator, .. } = fixture().await;
        let schema = count_flag();
        orchestrator.register(&schema).await.unwrap();

        let err = orchestrator
            .update(&schema, &subject(), 999, &count_flag_record(1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::TransactionFailed(ref msg) if msg.contains("AttestationNotFound")));
    }

    #[tokio::test]
    async fn test_update_unregistered_schema_batches_and_rolls_back() {
        let Fixture { ledger, orchestrator } = fixture().await;
        let schema = count_flag();

        let err = orchestrator
            .update(&schema, &subject(), FIRST_ATTESTATION_ID, &count_flag_record(1, true))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::TransactionFailed(
                "credentials.update_attestation: credentials.AttestationNotFound".to_string()
            )
        );

        let submissions = ledger.submissions().await;
        assert_eq!(submissions.len(), 2);
        let batch = &submissions[1];
        assert!(batch.batched);
        match &batch.calls[..] {
            [create @ Call::CreateSchema { .. }, Call::UpdateAttestation { attestation_id, .. }] => {
                assert_eq!(create, &Call::create_schema(issuer_hash("acme"), &schema));
                assert_eq!(*attestation_id, FIRST_ATTESTATION_ID);
            }
            other => panic!("unexpected calls: {other:?}"),
        }
        assert!(!orchestrator.schema_exists(&schema).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_subject_fails_before_submission() {
        let Fixture { ledger, orchestrator } = fixture().await;

        for bad in ["0xbb", "bob", "0xzz"] {
            let subject = AccountAddress::from(bad);
            let err = orchestrator
                .attest(&count_flag(), &subject, &count_flag_record(1, true))
                .await
                .unwrap_err();
            assert_eq!(err, OrchestratorError::InvalidAddress(subject));
        }
        assert_eq!(ledger.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_controller_rejected() {
        let ledger = Arc::new(MemoryLedger::new());
        let orchestrator = AttestationOrchestrator::new(
            ledger.clone(),
            Arc::new(KeypairSigner::generate()),
            ClientConfig::default(),
        );

        let err = orchestrator
            .create_issuer("acme", vec![AccountAddress::from("0x1234")])
            .await
            .unwrap_err();
        assert_eq!(err, OrchestratorError::InvalidAddress(AccountAddress::from("0x1234")));
        assert!(ledger.submissions().await.is_empty());
        assert_eq!(orchestrator.issuer().await, None);
    }

    #[tokio::test]
    async fn test_get_attestations_requires_schema() {
        let Fixture { orchestrator, .. } = fixture().await;
        let err = orchestrator.get_attestations(&count_flag(), &subject()).await.unwrap_err();
        assert_eq!(err, OrchestratorError::SchemaNotFound(count_flag().schema_hash()));
    }

    #[tokio::test]
    async fn test_get_schema_roundtrip() {
        let Fixture { orchestrator, .. } = fixture().await;
        let hash = orchestrator.register(&count_flag()).await.unwrap();

        assert_eq!(orchestrator.get_schema(&hash).await.unwrap(), count_flag());
        let missing = H256([1; 32]);
        assert_eq!(
            orchestrator.get_schema(&missing).await.unwrap_err(),
            OrchestratorError::SchemaNotFound(missing)
        );
    }

    #[tokio::test]
    async fn test_create_issuer_twice() {
        let Fixture { orchestrator, .. } = fixture().await;
        let err = orchestrator
            .create_issuer("acme", vec![orchestrator.account()])
            .await
            .unwrap_err();
        assert_eq!(err, OrchestratorError::IssuerAlreadyExists(issuer_hash("acme")));
    }

    #[tokio::test]
    async fn test_edit_issuer_rebinds() {
        let Fixture { orchestrator, .. } = fixture().await;
        let renamed = orchestrator
            .edit_issuer("acme labs", vec![orchestrator.account()])
            .await
            .unwrap();

        assert_eq!(renamed, issuer_hash("acme labs"));
        assert_eq!(orchestrator.issuer().await, Some(renamed));
        let record = orchestrator.get_issuer(&renamed).await.unwrap();
        assert_eq!(record.name, "acme labs");
        assert_eq!(
            orchestrator.get_issuer(&issuer_hash("acme")).await.unwrap_err(),
            OrchestratorError::IssuerNotFound(issuer_hash("acme"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_attests_get_distinct_ids() {
        let Fixture { orchestrator, .. } = fixture().await;
        let schema = count_flag();
        orchestrator.register(&schema).await.unwrap();

        let who = subject();
        let a = count_flag_record(1, true);
        let b = count_flag_record(2, false);
        let (first, second) = tokio::join!(
            orchestrator.attest(&schema, &who, &a),
            orchestrator.attest(&schema, &who, &b),
        );
        assert_ne!(first.unwrap().attestation_id, second.unwrap().attestation_id);
        assert_eq!(orchestrator.get_attestations(&schema, &subject()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_finalization() {
        let Fixture { orchestrator, .. } = fixture_with(ClientConfig::default().wait_for_finalization(true)).await;
        let receipt = orchestrator
            .attest(&count_flag(), &subject(), &count_flag_record(3, true))
            .await
            .unwrap();
        assert_eq!(receipt.attestation_id, FIRST_ATTESTATION_ID);
    }

    /// A ledger view that never sees registered schemas, as a caller losing
    /// the registration race would.
    struct StaleExistence(Arc<MemoryLedger>);

    #[async_trait]
    impl LedgerClient for StaleExistence {
        async fn query_schema_exists(&self, _hash: &SchemaHash) -> std::result::Result<bool, LedgerError> {
            Ok(false)
        }

        async fn query_schema(
            &self,
            hash: &SchemaHash,
        ) -> std::result::Result<Option<Vec<(String, u8)>>, LedgerError> {
            self.0.query_schema(hash).await
        }

        async fn query_issuer(&self, hash: &IssuerHash) -> std::result::Result<Option<IssuerRecord>, LedgerError> {
            self.0.query_issuer(hash).await
        }

        async fn query_attestations(
            &self,
            subject: &AccountAddress,
            issuer: &IssuerHash,
            schema: &SchemaHash,
        ) -> std::result::Result<Vec<StoredAttestation>, LedgerError> {
            self.0.query_attestations(subject, issuer, schema).await
        }

        async fn submit(
            &self,
            call: Call,
            signer: &dyn AccountSigner,
        ) -> std::result::Result<SubmissionStream, LedgerError> {
            self.0.submit(call, signer).await
        }

        async fn submit_batch(
            &self,
            calls: Vec<Call>,
            signer: &dyn AccountSigner,
        ) -> std::result::Result<SubmissionStream, LedgerError> {
            self.0.submit_batch(calls, signer).await
        }
    }

    #[tokio::test]
    async fn test_registration_race_loser_fails_atomically() {
        let Fixture { ledger, orchestrator } = fixture().await;
        let schema = count_flag();
        orchestrator.register(&schema).await.unwrap();
        let issuer = orchestrator.issuer().await.unwrap();

        let signer = Arc::new(KeypairSigner::generate());
        let late = AttestationOrchestrator::new(
            Arc::new(StaleExistence(ledger.clone())),
            signer.clone(),
            ClientConfig::default().with_issuer(issuer),
        );
        // give the late caller authority over the same issuer
        orchestrator
            .edit_issuer("acme", vec![orchestrator.account(), signer.address()])
            .await
            .unwrap();

        let err = late
            .attest(&schema, &subject(), &count_flag_record(1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::TransactionFailed(ref msg) if msg.contains("SchemaAlreadyExists")));
        assert!(orchestrator.get_attestations(&schema, &subject()).await.unwrap().is_empty());
    }
}

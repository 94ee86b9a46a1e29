//! Submission planning and the attestation state machine.
//!
//! Both are pure: the orchestrator decides *what* to submit here and only
//! then talks to the ledger.
//!
//! ```text
//! Unregistered -> Registering -> Registered -> Attesting -> Attested
//!                                Registered -> Updating  -> Attested
//! any non-terminal state -> Failed(reason)
//! ```

use credentials_core::{Call, IssuerHash, SchemaDefinition};
use std::fmt;
use tracing::debug;

/// The shape of the one submission an attest/update call makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// The schema is registered: submit the mutation alone.
    Solo(Call),
    /// The schema is new: register it and apply the mutation atomically.
    Batched(Call, Call),
}

impl SubmissionPlan {
    /// Decide between a plain mutation and a register-and-mutate batch.
    pub fn for_mutation(
        schema_exists: bool,
        issuer: IssuerHash,
        definition: &SchemaDefinition,
        mutation: Call,
    ) -> Self {
        if schema_exists {
            SubmissionPlan::Solo(mutation)
        } else {
            SubmissionPlan::Batched(Call::create_schema(issuer, definition), mutation)
        }
    }

    pub fn is_batched(&self) -> bool {
        matches!(self, SubmissionPlan::Batched(..))
    }

    /// The mutating call (attest or update), whatever the shape.
    pub fn mutation(&self) -> &Call {
        match self {
            SubmissionPlan::Solo(call) | SubmissionPlan::Batched(_, call) => call,
        }
    }

    pub fn into_calls(self) -> Vec<Call> {
        match self {
            SubmissionPlan::Solo(call) => vec![call],
            SubmissionPlan::Batched(create, call) => vec![create, call],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Unregistered,
    Registering,
    Registered,
    Attesting,
    Updating,
    Attested,
    Failed(String),
}

impl OperationState {
    /// Initial state for a call, given what the existence check found.
    pub fn initial(schema_exists: bool) -> Self {
        if schema_exists {
            OperationState::Registered
        } else {
            OperationState::Unregistered
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Attested | OperationState::Failed(_))
    }

    pub fn can_transition_to(&self, next: &OperationState) -> bool {
        use OperationState::*;

        match (self, next) {
            (state, Failed(_)) => !state.is_terminal(),
            (Unregistered, Registering)
            | (Registering, Registered)
            | (Registered, Attesting)
            | (Registered, Updating)
            | (Attesting, Attested)
            | (Updating, Attested) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationState::Unregistered => write!(f, "unregistered"),
            OperationState::Registering => write!(f, "registering"),
            OperationState::Registered => write!(f, "registered"),
            OperationState::Attesting => write!(f, "attesting"),
            OperationState::Updating => write!(f, "updating"),
            OperationState::Attested => write!(f, "attested"),
            OperationState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Tracks one call's progress through the state machine.
#[derive(Debug)]
pub(crate) struct Progress {
    operation: &'static str,
    state: OperationState,
}

impl Progress {
    pub(crate) fn new(operation: &'static str, initial: OperationState) -> Self {
        debug!(operation, state = %initial, "operation started");
        Self { operation, state: initial }
    }

    pub(crate) fn advance(&mut self, next: OperationState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(operation = self.operation, from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    pub(crate) fn fail(&mut self, reason: impl fmt::Display) {
        if !self.state.is_terminal() {
            self.advance(OperationState::Failed(reason.to_string()));
        }
    }

    pub(crate) fn state(&self) -> &OperationState {
        &self.state
    }
}

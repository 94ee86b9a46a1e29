//! Waiting for a submission to be confirmed or rejected.

use crate::error::{OrchestratorError, Result};
use crate::ledger::{BlockRef, LedgerEvent, SubmissionStream, TxStatus};
use tracing::{debug, info, warn};

/// A confirming event's payload and the block it was included in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Confirmed<T> {
    pub value: T,
    pub block: BlockRef,
}

/// Consume `stream` until the submission is confirmed or rejected.
///
/// `confirm` picks the event that proves the mutation happened. The call
/// resolves once that event has been seen and the submission is included
/// (or finalized, with `wait_for_finalization`). An `ExtrinsicFailed` event
/// or a dropped status rejects immediately, even when the same update also
/// reports inclusion.
pub(crate) async fn watch_submission<T, F>(
    label: &str,
    mut stream: SubmissionStream,
    wait_for_finalization: bool,
    mut confirm: F,
) -> Result<Confirmed<T>>
where
    F: FnMut(&LedgerEvent) -> Option<T>,
{
    let mut confirmed: Option<T> = None;

    while let Some(update) = stream.recv().await {
        if let Some(err) = update.events.iter().find_map(|event| match event {
            LedgerEvent::ExtrinsicFailed(err) => Some(err),
            _ => None,
        }) {
            warn!(call = label, error = %err, "extrinsic failed");
            return Err(OrchestratorError::TransactionFailed(format!("{label}: {err}")));
        }

        if confirmed.is_none() {
            confirmed = update.events.iter().find_map(&mut confirm);
        }

        match &update.status {
            TxStatus::Ready => debug!(call = label, "submission ready"),
            TxStatus::Dropped(reason) => {
                warn!(call = label, reason = %reason, "submission dropped");
                return Err(OrchestratorError::TransactionFailed(format!(
                    "{label}: dropped before inclusion: {reason}"
                )));
            }
            status => {
                let Some(block) = status.included_in() else {
                    continue;
                };
                let finalized = status.is_finalized();
                info!(call = label, block = %block, finalized, "submission included");

                if confirmed.is_some() && (finalized || !wait_for_finalization) {
                    if let Some(value) = confirmed.take() {
                        return Ok(Confirmed { value, block });
                    }
                }

                if finalized {
                    return Err(OrchestratorError::TransactionFailed(format!(
                        "{label}: finalized in block {block} without a confirming event"
                    )));
                }
            }
        }
    }

    Err(OrchestratorError::TransactionFailed(format!(
        "{label}: submission stream ended before confirmation"
    )))
}

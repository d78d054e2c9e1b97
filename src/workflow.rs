use crate::{
    error::{
        AppResult,
        MintError,
    },
    poller::SnapshotPublisher,
    snapshot::SnapshotSource,
};
use ethers::types::H256;
use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};
use tokio::time::timeout;
use tracing::{
    error,
    info,
    warn,
};

/// The three value-bearing contract calls a user can initiate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkflowKind {
    StartPresale,
    PresaleMint,
    PublicMint,
}

impl WorkflowKind {
    /// Mint workflows attach the fixed price; starting the presale does not.
    pub fn is_mint(&self) -> bool {
        matches!(self, Self::PresaleMint | Self::PublicMint)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkflowPhase {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Refreshing,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OutcomeKind {
    Success,
    UserRejected,
    NetworkError(String),
    /// Revert reason surfaced verbatim.
    ContractRevert(String),
    Timeout,
}

/// Result of one workflow invocation, surfaced to the caller and then
/// discarded; nothing here is persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionOutcome {
    pub kind: OutcomeKind,
    pub tx_hash: Option<H256>,
}

/// Submission side of the contract client. Split from the confirmation wait
/// so the runner can bound the latter with a timeout.
pub trait MintSubmitter {
    fn submit(&self, kind: WorkflowKind) -> impl Future<Output = AppResult<H256>> + Send;

    fn await_confirmation(&self, tx_hash: H256) -> impl Future<Output = AppResult<H256>> + Send;
}

/// Drives a single in-flight mutating call:
/// `Idle -> Submitting -> AwaitingConfirmation -> Refreshing -> Idle`, with
/// every failure path returning to `Idle` and reported in the outcome. A
/// second invocation while one is active is rejected with `WorkflowBusy`,
/// never queued.
pub struct WorkflowRunner<C> {
    contract: Arc<C>,
    publisher: SnapshotPublisher,
    phase: Mutex<WorkflowPhase>,
    confirmation_timeout: Duration,
}

/// Resets the phase to `Idle` when the workflow ends, on every exit path.
struct PhaseGuard<'a> {
    phase: &'a Mutex<WorkflowPhase>,
}

impl PhaseGuard<'_> {
    fn set(&self, next: WorkflowPhase) {
        *self.phase.lock().expect("phase lock poisoned") = next;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock().expect("phase lock poisoned") = WorkflowPhase::Idle;
    }
}

impl<C> WorkflowRunner<C>
where
    C: SnapshotSource + MintSubmitter + Send + Sync,
{
    pub fn new(
        contract: Arc<C>,
        publisher: SnapshotPublisher,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            contract,
            publisher,
            phase: Mutex::new(WorkflowPhase::Idle),
            confirmation_timeout,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    /// The mutual-exclusion flag the presentation layer derives
    /// `ActionInFlight` from.
    pub fn is_in_flight(&self) -> bool {
        self.phase() != WorkflowPhase::Idle
    }

    fn begin(&self) -> AppResult<PhaseGuard<'_>> {
        let mut phase = self.phase.lock().expect("phase lock poisoned");
        if *phase != WorkflowPhase::Idle {
            return Err(MintError::WorkflowBusy);
        }
        *phase = WorkflowPhase::Submitting;
        Ok(PhaseGuard { phase: &self.phase })
    }

    /// Runs one workflow to completion. Precondition failures (`WorkflowBusy`,
    /// `NotConnected`, `WrongNetwork`) are `Err`: the workflow never started.
    /// Failures of a started workflow come back as `Ok` with the failure in
    /// the outcome, so the caller can always retry.
    pub async fn run(&self, kind: WorkflowKind) -> AppResult<TransactionOutcome> {
        let guard = self.begin()?;
        info!(?kind, "submitting transaction");

        let tx_hash = match self.contract.submit(kind).await {
            Ok(tx_hash) => tx_hash,
            Err(e @ (MintError::NotConnected | MintError::WrongNetwork { .. })) => {
                return Err(e);
            }
            Err(MintError::UserRejected) => {
                info!(?kind, "submission declined by wallet");
                return Ok(TransactionOutcome {
                    kind: OutcomeKind::UserRejected,
                    tx_hash: None,
                });
            }
            Err(MintError::Revert(reason)) => {
                error!(?kind, %reason, "submission reverted");
                return Ok(TransactionOutcome {
                    kind: OutcomeKind::ContractRevert(reason),
                    tx_hash: None,
                });
            }
            Err(e) => {
                error!(?kind, error = %e, "submission failed");
                return Ok(TransactionOutcome {
                    kind: OutcomeKind::NetworkError(e.to_string()),
                    tx_hash: None,
                });
            }
        };

        guard.set(WorkflowPhase::AwaitingConfirmation);
        let confirmation = timeout(
            self.confirmation_timeout,
            self.contract.await_confirmation(tx_hash),
        )
        .await;
        let confirmed = match confirmation {
            Err(_) => {
                // The transaction may still land; we only report what we
                // observed, and the next poll will pick up its effects.
                error!(?kind, %tx_hash, "confirmation wait timed out");
                return Ok(TransactionOutcome {
                    kind: OutcomeKind::Timeout,
                    tx_hash: Some(tx_hash),
                });
            }
            Ok(Err(MintError::Revert(reason))) => {
                error!(?kind, %tx_hash, %reason, "transaction reverted");
                return Ok(TransactionOutcome {
                    kind: OutcomeKind::ContractRevert(reason),
                    tx_hash: Some(tx_hash),
                });
            }
            Ok(Err(e)) => {
                error!(?kind, %tx_hash, error = %e, "confirmation wait failed");
                return Ok(TransactionOutcome {
                    kind: OutcomeKind::NetworkError(e.to_string()),
                    tx_hash: Some(tx_hash),
                });
            }
            Ok(Ok(confirmed)) => confirmed,
        };

        // Out-of-band refresh so the UI reflects the new minted count without
        // waiting for the next scheduled poll tick.
        guard.set(WorkflowPhase::Refreshing);
        match self.contract.read_snapshot().await {
            Ok(snapshot) => {
                self.publisher.send_replace(Some(snapshot));
            }
            Err(e) => {
                warn!(error = %e, "post-confirmation refresh failed; next poll will catch up");
            }
        }

        info!(?kind, tx_hash = %confirmed, "transaction confirmed");
        Ok(TransactionOutcome {
            kind: OutcomeKind::Success,
            tx_hash: Some(confirmed),
        })
    }
}

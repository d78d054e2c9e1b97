use crate::{
    config::AppConfig,
    contract::CryptoDevsClient,
    error::{
        AppResult,
        MintError,
    },
    gateway::{
        ChainGateway,
        WalletConnector,
        WalletSession,
    },
    poller::{
        self,
        PollScheduler,
        SnapshotPublisher,
    },
    snapshot::{
        ContractSnapshot,
        SnapshotSource,
    },
    state::{
        self,
        ConnectionStatus,
        PresentationState,
    },
    workflow::{
        MintSubmitter,
        TransactionOutcome,
        WorkflowKind,
        WorkflowRunner,
    },
};
use chrono::Utc;
use std::{
    sync::{
        Arc,
        RwLock,
    },
    time::Duration,
};
use tokio::sync::watch;

/// Composition root: owns the wallet seam, the contract client, the workflow
/// runner and the poll scheduler, and exposes one coherent view of connection
/// and contract state to the rendering layer.
pub struct MintController<W, C> {
    wallet: Arc<W>,
    contract: Arc<C>,
    runner: WorkflowRunner<C>,
    publisher: SnapshotPublisher,
    snapshots: watch::Receiver<Option<ContractSnapshot>>,
    scheduler: Option<PollScheduler>,
    poll_interval: Duration,
    status: RwLock<ConnectionStatus>,
}

impl MintController<ChainGateway, CryptoDevsClient> {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let gateway = Arc::new(ChainGateway::new(config)?);
        let contract = Arc::new(CryptoDevsClient::new(gateway.clone(), config.mint_price_wei));
        Ok(Self::with_parts(
            gateway,
            contract,
            config.poll_interval(),
            config.confirmation_timeout(),
        ))
    }
}

impl<W, C> MintController<W, C>
where
    W: WalletConnector,
    C: SnapshotSource + MintSubmitter + Send + Sync + 'static,
{
    pub fn with_parts(
        wallet: Arc<W>,
        contract: Arc<C>,
        poll_interval: Duration,
        confirmation_timeout: Duration,
    ) -> Self {
        let (publisher, snapshots) = poller::snapshot_channel();
        let runner = WorkflowRunner::new(contract.clone(), publisher.clone(), confirmation_timeout);
        Self {
            wallet,
            contract,
            runner,
            publisher,
            snapshots,
            scheduler: None,
            poll_interval,
            status: RwLock::new(ConnectionStatus::Disconnected),
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        *self.status.write().expect("status lock poisoned") = status;
    }

    pub async fn connect(&self) -> AppResult<WalletSession> {
        self.set_status(ConnectionStatus::Connecting);
        match self.wallet.connect().await {
            Ok(session) => {
                self.set_status(ConnectionStatus::Connected(session));
                Ok(session)
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Disconnected);
                Err(e)
            }
        }
    }

    /// Starts the poll scheduler. Requires an established session; mounting
    /// twice is a no-op.
    pub fn mount(&mut self) -> AppResult<()> {
        if self.wallet.session().is_none() {
            return Err(MintError::NotConnected);
        }
        if self.scheduler.is_none() {
            self.scheduler = Some(PollScheduler::spawn(
                self.contract.clone(),
                self.poll_interval,
                self.publisher.clone(),
            ));
        }
        Ok(())
    }

    pub async fn unmount(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        let status = *self.status.read().expect("status lock poisoned");
        match status {
            // the wallet seam may have torn the session down (e.g. a network
            // switch); reflect that instead of the cached status
            ConnectionStatus::Connected(_) if self.wallet.session().is_none() => {
                ConnectionStatus::Disconnected
            }
            other => other,
        }
    }

    pub fn latest_snapshot(&self) -> Option<ContractSnapshot> {
        *self.snapshots.borrow()
    }

    /// A fresh receiver for the rendering layer to await snapshot changes on.
    /// Subscribed at the current value, so `changed()` only wakes for
    /// publications made after this call.
    pub fn snapshots(&self) -> watch::Receiver<Option<ContractSnapshot>> {
        self.publisher.subscribe()
    }

    pub fn current_state(&self) -> PresentationState {
        let snapshot = self.latest_snapshot();
        state::derive(
            self.status(),
            snapshot.as_ref(),
            self.runner.is_in_flight(),
            unix_now(),
        )
    }

    pub async fn run(&self, kind: WorkflowKind) -> AppResult<TransactionOutcome> {
        self.runner.run(kind).await
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

use crate::{
    error::{
        AppResult,
        MintError,
    },
    gateway::{
        WalletConnector,
        WalletSession,
    },
    snapshot::{
        ContractSnapshot,
        SnapshotSource,
    },
    workflow::{
        MintSubmitter,
        WorkflowKind,
    },
};
use ethers::types::{
    Address,
    H256,
};
use std::{
    collections::VecDeque,
    future::pending,
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};

pub fn owner_address() -> Address {
    Address::from_low_u64_be(0xA)
}

pub fn minter_address() -> Address {
    Address::from_low_u64_be(0xB)
}

pub fn tx_hash(n: u64) -> H256 {
    H256::from_low_u64_be(n)
}

/// A started, far-from-over presale snapshot with the given minted count.
pub fn snapshot_with_minted(tokens_minted: u64) -> ContractSnapshot {
    ContractSnapshot {
        presale_started: true,
        presale_end_time: u64::MAX,
        owner: owner_address(),
        tokens_minted,
    }
}

#[derive(Default)]
struct FakeState {
    scripted_reads: VecDeque<AppResult<ContractSnapshot>>,
    fallback_snapshot: Option<ContractSnapshot>,
    read_delay: Option<Duration>,
    submissions: VecDeque<AppResult<H256>>,
    confirmations: VecDeque<AppResult<H256>>,
    hang_confirmations: bool,
    submitted: Vec<WorkflowKind>,
    read_count: usize,
    reads_in_flight: usize,
    max_concurrent_reads: usize,
}

/// In-memory stand-in for the deployed contract: reads and submissions are
/// scripted per test, and the fake records what the code under test did.
pub struct FakeContract {
    state: Mutex<FakeState>,
}

impl FakeContract {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock poisoned")
    }

    /// Snapshot returned by every read once the scripted queue is drained.
    pub fn set_snapshot(&self, snapshot: ContractSnapshot) {
        self.state().fallback_snapshot = Some(snapshot);
    }

    /// One-shot read results, consumed in order before the fallback.
    pub fn push_read(&self, result: AppResult<ContractSnapshot>) {
        self.state().scripted_reads.push_back(result);
    }

    /// Simulated network latency applied to every read.
    pub fn set_read_delay(&self, delay: Duration) {
        self.state().read_delay = Some(delay);
    }

    pub fn push_submission(&self, result: AppResult<H256>) {
        self.state().submissions.push_back(result);
    }

    pub fn push_confirmation(&self, result: AppResult<H256>) {
        self.state().confirmations.push_back(result);
    }

    /// Confirmation waits never resolve once the scripted queue is drained.
    pub fn hang_confirmations(&self) {
        self.state().hang_confirmations = true;
    }

    pub fn submitted(&self) -> Vec<WorkflowKind> {
        self.state().submitted.clone()
    }

    pub fn read_count(&self) -> usize {
        self.state().read_count
    }

    /// Highest number of reads ever in flight at once; the poller must keep
    /// this at one.
    pub fn max_concurrent_reads(&self) -> usize {
        self.state().max_concurrent_reads
    }
}

/// Decrements `reads_in_flight` when a read future completes or is dropped
/// mid-delay, so a cancelled poll never shows up as a phantom overlap.
struct InFlightRead<'a> {
    contract: &'a FakeContract,
}

impl Drop for InFlightRead<'_> {
    fn drop(&mut self) {
        self.contract.state().reads_in_flight -= 1;
    }
}

impl SnapshotSource for FakeContract {
    async fn read_snapshot(&self) -> AppResult<ContractSnapshot> {
        let delay = {
            let mut state = self.state();
            state.reads_in_flight += 1;
            state.max_concurrent_reads = state.max_concurrent_reads.max(state.reads_in_flight);
            state.read_delay
        };
        let _in_flight = InFlightRead { contract: self };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        state.read_count += 1;
        match state.scripted_reads.pop_front() {
            Some(result) => result,
            None => match state.fallback_snapshot {
                Some(snapshot) => Ok(snapshot),
                None => Err(MintError::Rpc("no scripted snapshot".to_string())),
            },
        }
    }
}

impl MintSubmitter for FakeContract {
    async fn submit(&self, kind: WorkflowKind) -> AppResult<H256> {
        let mut state = self.state();
        state.submitted.push(kind);
        let fallback = tx_hash(state.submitted.len() as u64);
        state.submissions.pop_front().unwrap_or(Ok(fallback))
    }

    async fn await_confirmation(&self, tx_hash: H256) -> AppResult<H256> {
        let (scripted, hang) = {
            let mut state = self.state();
            (state.confirmations.pop_front(), state.hang_confirmations)
        };
        match scripted {
            Some(result) => result,
            None if hang => pending().await,
            None => Ok(tx_hash),
        }
    }
}

/// Wallet seam fake for controller tests.
pub struct FakeWallet {
    address: Address,
    chain_id: u64,
    reject_connect: bool,
    session: Mutex<Option<WalletSession>>,
}

impl FakeWallet {
    pub fn new(address: Address) -> Arc<Self> {
        Arc::new(Self {
            address,
            chain_id: 5,
            reject_connect: false,
            session: Mutex::new(None),
        })
    }

    /// A wallet whose user declines every connection request.
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            address: minter_address(),
            chain_id: 5,
            reject_connect: true,
            session: Mutex::new(None),
        })
    }
}

impl WalletConnector for FakeWallet {
    async fn connect(&self) -> AppResult<WalletSession> {
        if self.reject_connect {
            return Err(MintError::UserRejected);
        }
        let session = WalletSession {
            address: self.address,
            chain_id: self.chain_id,
        };
        *self.session.lock().expect("fake session lock poisoned") = Some(session);
        Ok(session)
    }

    fn session(&self) -> Option<WalletSession> {
        *self.session.lock().expect("fake session lock poisoned")
    }
}

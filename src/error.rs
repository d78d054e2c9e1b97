use thiserror::Error;

/// Failure taxonomy for the mint controller.
///
/// Read-path errors (`Rpc`) are swallowed at the poll boundary and logged;
/// write-path errors are mapped into a `TransactionOutcome` by the workflow
/// runner and never swallowed.
#[derive(Debug, Error)]
pub enum MintError {
    #[error("wallet declined the request")]
    UserRejected,

    #[error(
        "connected to chain {actual}, but this collection lives on chain {expected}; \
         switch your wallet network and reconnect"
    )]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("no wallet session; connect a wallet first")]
    NotConnected,

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("contract reverted: {0}")]
    Revert(String),

    #[error("timed out waiting for transaction confirmation")]
    Timeout,

    #[error("another transaction workflow is already in flight")]
    WorkflowBusy,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, MintError>;

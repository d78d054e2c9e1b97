use crate::{
    error::{
        AppResult,
        MintError,
    },
    gateway::ChainGateway,
    snapshot::{
        ContractSnapshot,
        SnapshotSource,
    },
    workflow::{
        MintSubmitter,
        WorkflowKind,
    },
};
use ethers::{
    contract::ContractError,
    providers::{
        Middleware,
        PendingTransaction,
    },
    types::{
        H256,
        U256,
    },
};
use std::sync::Arc;

/// Ethers-backed contract client: the concrete reader and submitter behind
/// [`SnapshotSource`] and [`MintSubmitter`]. Handles are acquired from the
/// gateway per operation, never cached across suspension points.
pub struct CryptoDevsClient {
    gateway: Arc<ChainGateway>,
    mint_price: U256,
}

impl CryptoDevsClient {
    pub fn new(gateway: Arc<ChainGateway>, mint_price_wei: u128) -> Self {
        Self {
            gateway,
            mint_price: U256::from(mint_price_wei),
        }
    }
}

fn call_error<M: Middleware>(err: ContractError<M>) -> MintError {
    // `Error(string)` reverts decode to the reason; anything else is treated
    // as a transport failure.
    match err.decode_revert::<String>() {
        Some(reason) => MintError::Revert(reason),
        None => MintError::Rpc(err.to_string()),
    }
}

impl SnapshotSource for CryptoDevsClient {
    async fn read_snapshot(&self) -> AppResult<ContractSnapshot> {
        let contract = self.gateway.read_handle().await?;
        // Four independent reads; the contract offers no multi-read
        // transaction, so fields may land at slightly different block
        // heights. Consumers tolerate the window.
        let presale_started = contract
            .presale_started()
            .call()
            .await
            .map_err(call_error)?;
        let presale_end_time = contract.presale_ended().call().await.map_err(call_error)?;
        let owner = contract.owner().call().await.map_err(call_error)?;
        let tokens_minted = contract.token_ids().call().await.map_err(call_error)?;
        Ok(ContractSnapshot {
            presale_started,
            presale_end_time: presale_end_time.as_u64(),
            owner,
            tokens_minted: tokens_minted.as_u64(),
        })
    }
}

impl MintSubmitter for CryptoDevsClient {
    async fn submit(&self, kind: WorkflowKind) -> AppResult<H256> {
        let contract = self.gateway.signer_handle().await?;
        let call = match kind {
            WorkflowKind::StartPresale => contract.start_presale(),
            WorkflowKind::PresaleMint => contract.presale_mint().value(self.mint_price),
            WorkflowKind::PublicMint => contract.mint().value(self.mint_price),
        };
        let pending = call.send().await.map_err(call_error)?;
        Ok(*pending)
    }

    async fn await_confirmation(&self, tx_hash: H256) -> AppResult<H256> {
        let provider = self.gateway.provider();
        let receipt = PendingTransaction::new(tx_hash, provider.as_ref())
            .await
            .map_err(|e| MintError::Rpc(e.to_string()))?;
        match receipt {
            Some(receipt) if receipt.status == Some(1u64.into()) => Ok(tx_hash),
            // The receipt carries no revert reason; reverts caught at
            // submission simulation surface theirs through `call_error`.
            Some(receipt) => Err(MintError::Revert(format!(
                "transaction {tx_hash} reverted in block {:?}",
                receipt.block_number
            ))),
            None => Err(MintError::Rpc(format!(
                "transaction {tx_hash} was dropped without a receipt"
            ))),
        }
    }
}

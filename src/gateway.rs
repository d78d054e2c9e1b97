use crate::{
    config::AppConfig,
    error::{
        AppResult,
        MintError,
    },
    nft_types::CryptoDevs,
};
use ethers::{
    middleware::SignerMiddleware,
    providers::{
        Http,
        Middleware,
        Provider,
    },
    signers::{
        LocalWallet,
        Signer,
    },
    types::Address,
};
use std::sync::{
    Arc,
    RwLock,
};
use tracing::info;

/// A validated wallet connection on the required network. Not persisted;
/// reconnect after a restart or a network switch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WalletSession {
    pub address: Address,
    pub chain_id: u64,
}

/// Seam between the controller and whatever provides the wallet connection.
/// Production uses [`ChainGateway`]; tests use an in-memory fake.
pub trait WalletConnector {
    fn connect(&self) -> impl Future<Output = AppResult<WalletSession>> + Send;

    fn session(&self) -> Option<WalletSession>;
}

/// Owns the RPC provider and the signing key. All other components borrow
/// read-only snapshots or acquire short-lived handles here; nothing else
/// touches the connection directly.
pub struct ChainGateway {
    provider: Arc<Provider<Http>>,
    signer: LocalWallet,
    contract_address: Address,
    required_chain_id: u64,
    session: RwLock<Option<WalletSession>>,
}

impl ChainGateway {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| MintError::Config(format!("bad rpc url: {e}")))?;
        let signer: LocalWallet = config
            .private_key
            .trim_start_matches("0x")
            .parse()
            .map_err(|_| MintError::Config("unparseable signing key".to_string()))?;
        let contract_address: Address = config
            .contract_address
            .parse()
            .map_err(|_| MintError::Config("unparseable contract address".to_string()))?;
        Ok(Self {
            provider: Arc::new(provider),
            signer,
            contract_address,
            required_chain_id: config.required_chain_id,
            session: RwLock::new(None),
        })
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    pub fn disconnect(&self) {
        *self.session.write().expect("session lock poisoned") = None;
    }

    /// Checks the live chain id against the required one. A mismatch tears
    /// down the session so the caller is forced through `connect` again; no
    /// automatic network-switch request is issued to the wallet.
    async fn validate_network(&self) -> AppResult<u64> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| MintError::Rpc(e.to_string()))?
            .as_u64();
        self.check_network(chain_id)
    }

    fn check_network(&self, actual: u64) -> AppResult<u64> {
        if actual != self.required_chain_id {
            self.disconnect();
            return Err(MintError::WrongNetwork {
                expected: self.required_chain_id,
                actual,
            });
        }
        Ok(actual)
    }

    fn current_session(&self) -> AppResult<WalletSession> {
        self.session
            .read()
            .expect("session lock poisoned")
            .ok_or(MintError::NotConnected)
    }

    /// Read-only contract handle. Re-validates the network on every
    /// acquisition; handles are never held across a poll cycle.
    pub async fn read_handle(&self) -> AppResult<CryptoDevs<Provider<Http>>> {
        self.current_session()?;
        self.validate_network().await?;
        Ok(CryptoDevs::new(self.contract_address, self.provider.clone()))
    }

    /// Signing contract handle for value-bearing calls.
    pub async fn signer_handle(
        &self,
    ) -> AppResult<CryptoDevs<SignerMiddleware<Provider<Http>, LocalWallet>>> {
        let session = self.current_session()?;
        self.validate_network().await?;
        let signer = self.signer.clone().with_chain_id(session.chain_id);
        let middleware = SignerMiddleware::new((*self.provider).clone(), signer);
        Ok(CryptoDevs::new(self.contract_address, Arc::new(middleware)))
    }
}

impl WalletConnector for ChainGateway {
    async fn connect(&self) -> AppResult<WalletSession> {
        let chain_id = self.validate_network().await?;
        let session = WalletSession {
            address: self.signer.address(),
            chain_id,
        };
        *self.session.write().expect("session lock poisoned") = Some(session);
        info!(address = %session.address, chain_id, "wallet connected");
        Ok(session)
    }

    fn session(&self) -> Option<WalletSession> {
        *self.session.read().expect("session lock poisoned")
    }
}

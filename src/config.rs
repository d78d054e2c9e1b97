use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::Deserialize;
use std::{
    fs,
    path::Path,
    time::Duration,
};

/// Controller configuration, loaded from a JSON file. Only the connection
/// essentials are required; everything else has contract-matching defaults.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// HTTP JSON-RPC endpoint of the required network.
    pub rpc_url: String,
    /// Hex-encoded signing key (`0x` prefix optional).
    pub private_key: String,
    /// Deployed collection contract.
    pub contract_address: String,
    #[serde(default = "default_required_chain_id")]
    pub required_chain_id: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Fixed price attached to both presale and public mints.
    #[serde(default = "default_mint_price_wei")]
    pub mint_price_wei: u128,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Base URL the per-token asset path is appended to.
    #[serde(default = "default_base_asset_url")]
    pub base_asset_url: String,
}

fn default_required_chain_id() -> u64 {
    // Goerli
    5
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_mint_price_wei() -> u128 {
    // 0.01 ether
    10_000_000_000_000_000
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_base_asset_url() -> String {
    "https://raw.githubusercontent.com/LearnWeb3DAO/NFT-Collection/main/my-app/public/cryptodevs/"
        .to_string()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load__fills_defaults_for_omitted_fields() {
        let raw = r#"{
            "rpc_url": "http://localhost:8545",
            "private_key": "0x0123",
            "contract_address": "0x0000000000000000000000000000000000000001"
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.required_chain_id, 5);
        assert_eq!(config.poll_interval_ms, 5_000);
        assert_eq!(config.mint_price_wei, 10_000_000_000_000_000);
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }
}

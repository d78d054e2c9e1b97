pub mod config;

pub mod contract;

pub mod controller;

pub mod error;

pub mod gateway;

pub mod metadata;

pub mod poller;

pub mod snapshot;

pub mod state;

pub mod workflow;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub mod nft_types {
    use ethers::prelude::abigen;

    abigen!(
        CryptoDevs,
        r#"[
            function presaleStarted() external view returns (bool)
            function presaleEnded() external view returns (uint256)
            function owner() external view returns (address)
            function tokenIds() external view returns (uint256)
            function startPresale() external
            function presaleMint() external payable
            function mint() external payable
        ]"#
    );
}

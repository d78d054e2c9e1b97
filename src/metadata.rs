use serde::Serialize;

/// Token metadata in the shape marketplaces expect. The asset files are
/// numbered from zero while token ids start at one.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
}

pub fn token_metadata(token_id: u64, base_asset_url: &str) -> TokenMetadata {
    TokenMetadata {
        name: format!("CryptoDev #{token_id}"),
        description: format!(
            "CryptoDev #{token_id} is a unique NFT that can be used to represent \
             a developer in the WEB3 space."
        ),
        image: format!("{base_asset_url}{}.svg", token_id.saturating_sub(1)),
    }
}

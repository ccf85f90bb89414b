use std::fmt;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use bon::Builder;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, thiserror::Error)]
#[error("config error {0}: {1}")]
pub struct ConfigError(PathBuf, #[source] Box<dyn std::error::Error + Send + Sync>);

/// Contents of a `ghostvote.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub chain: ChainConfig,
    pub wallet: WalletConfig,
}

impl Config {
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError(path.into(), Box::new(e)))?;
        toml::from_str(&s).map_err(|e| ConfigError(path.into(), Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    pub id: u64,
    pub rpc_url: Url,
    /// Address of the deployed GhostVote contract.
    pub ghostvote_contract: Address,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WalletConfig {
    pub mnemonic: String,
    #[serde(default)]
    pub account_index: u32,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("mnemonic", &"<redacted>")
            .field("account_index", &self.account_index)
            .finish()
    }
}

use crate::network::ChainConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Explorer used when the chain is unknown.
pub const DEFAULT_EXPLORER: &str = "https://etherscan.io";

/// Kind of explorer page to link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorerKind {
    #[default]
    Tx,
    Address,
    Token,
}

impl ExplorerKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tx => "tx",
            Self::Address => "address",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for ExplorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical explorer URL for a transaction, address or token on `chain_id`.
pub fn explorer_url(chain_id: u64, hash: impl fmt::Display, kind: ExplorerKind) -> String {
    let base = ChainConfig::from_chain_id(chain_id)
        .map(|c| c.explorer_url)
        .unwrap_or(DEFAULT_EXPLORER);
    format!("{base}/{kind}/{hash}")
}

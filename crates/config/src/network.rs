//! Chain metadata for the networks the dashboard knows about.
//!
//! Only chain ids with a token list in [`crate::TokenRegistry`] are usable from
//! the dashboard; the rest are here so explorer links and native currency
//! labels resolve for any chain a wallet might report.

use serde::Serialize;

/// Static description of an EVM chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Human readable network name
    pub name: &'static str,
    /// Native currency symbol used for gas
    pub native_symbol: &'static str,
    /// Price feed identifier of the native currency
    pub native_price_id: &'static str,
    /// Block explorer base URL (no trailing slash)
    pub explorer_url: &'static str,
}

impl ChainConfig {
    /// Ethereum mainnet.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: 1,
            name: "Ethereum",
            native_symbol: "ETH",
            native_price_id: "ethereum",
            explorer_url: "https://etherscan.io",
        }
    }

    /// Ethereum Sepolia testnet.
    pub const fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            name: "Sepolia",
            native_symbol: "ETH",
            native_price_id: "ethereum",
            explorer_url: "https://sepolia.etherscan.io",
        }
    }

    /// Arbitrum One.
    pub const fn arbitrum() -> Self {
        Self {
            chain_id: 42161,
            name: "Arbitrum One",
            native_symbol: "ETH",
            native_price_id: "ethereum",
            explorer_url: "https://arbiscan.io",
        }
    }

    /// Arbitrum Sepolia testnet.
    pub const fn arbitrum_sepolia() -> Self {
        Self {
            chain_id: 421614,
            name: "Arbitrum Sepolia",
            native_symbol: "ETH",
            native_price_id: "ethereum",
            explorer_url: "https://sepolia.arbiscan.io",
        }
    }

    /// OP Mainnet.
    pub const fn optimism() -> Self {
        Self {
            chain_id: 10,
            name: "OP Mainnet",
            native_symbol: "ETH",
            native_price_id: "ethereum",
            explorer_url: "https://optimistic.etherscan.io",
        }
    }

    /// Polygon PoS.
    pub const fn polygon() -> Self {
        Self {
            chain_id: 137,
            name: "Polygon",
            native_symbol: "POL",
            native_price_id: "polygon-ecosystem-token",
            explorer_url: "https://polygonscan.com",
        }
    }

    /// Base.
    pub const fn base() -> Self {
        Self {
            chain_id: 8453,
            name: "Base",
            native_symbol: "ETH",
            native_price_id: "ethereum",
            explorer_url: "https://basescan.org",
        }
    }

    /// BNB Smart Chain.
    pub const fn bsc() -> Self {
        Self {
            chain_id: 56,
            name: "BNB Smart Chain",
            native_symbol: "BNB",
            native_price_id: "binancecoin",
            explorer_url: "https://bscscan.com",
        }
    }

    /// All known chains.
    pub const fn all() -> [Self; 8] {
        [
            Self::mainnet(),
            Self::sepolia(),
            Self::arbitrum(),
            Self::arbitrum_sepolia(),
            Self::optimism(),
            Self::polygon(),
            Self::base(),
            Self::bsc(),
        ]
    }

    /// Look up a chain by id.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::all().into_iter().find(|c| c.chain_id == chain_id)
    }
}

pub const SEPOLIA: u64 = ChainConfig::sepolia().chain_id;
pub const ARBITRUM_SEPOLIA: u64 = ChainConfig::arbitrum_sepolia().chain_id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_chain() {
        let chain = ChainConfig::from_chain_id(421614).unwrap();
        assert_eq!(chain.name, "Arbitrum Sepolia");
        assert_eq!(chain.native_price_id, "ethereum");
    }

    #[test]
    fn test_lookup_unknown_chain() {
        assert!(ChainConfig::from_chain_id(999_999).is_none());
    }

    #[test]
    fn test_chain_ids_are_unique() {
        let chains = ChainConfig::all();
        for (i, a) in chains.iter().enumerate() {
            for b in &chains[i + 1..] {
                assert_ne!(a.chain_id, b.chain_id);
            }
        }
    }
}

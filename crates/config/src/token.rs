//! Token descriptors and the per-chain token registry.

use crate::network::{ARBITRUM_SEPOLIA, SEPOLIA};
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest decimals value a U256 amount can be scaled by.
const MAX_DECIMALS: u8 = 77;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("token {query} is not configured on chain {chain_id}")]
    UnknownToken { chain_id: u64, query: String },

    #[error("token {symbol} declares {decimals} decimals (max {MAX_DECIMALS})")]
    InvalidDecimals { symbol: String, decimals: u8 },
}

/// Immutable description of an ERC20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token contract address
    pub address: Address,
    pub symbol: String,
    pub name: String,
    /// Decimal precision of on-chain amounts
    pub decimals: u8,
    /// Logo image URL
    pub logo: String,
    /// Price feed identifier (CoinGecko asset id)
    pub price_id: String,
}

impl Token {
    fn builtin(
        address: Address,
        symbol: &str,
        name: &str,
        decimals: u8,
        logo: &str,
        price_id: &str,
    ) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            logo: logo.to_string(),
            price_id: price_id.to_string(),
        }
    }

    /// Build the EIP-747 `wallet_watchAsset` request for this token.
    pub fn watch_asset_request(&self) -> WatchAssetRequest {
        WatchAssetRequest {
            asset_type: "ERC20",
            options: WatchAssetOptions {
                address: self.address,
                symbol: self.symbol.clone(),
                decimals: self.decimals,
                image: self.logo.clone(),
            },
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(query)
            || self.address.to_string().eq_ignore_ascii_case(query)
    }
}

/// Parameters of a `wallet_watchAsset` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchAssetRequest {
    #[serde(rename = "type")]
    pub asset_type: &'static str,
    pub options: WatchAssetOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchAssetOptions {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub image: String,
}

/// Token lists keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    tokens: BTreeMap<u64, Vec<Token>>,
}

impl TokenRegistry {
    /// Empty registry.
    pub const fn empty() -> Self {
        Self {
            tokens: BTreeMap::new(),
        }
    }

    /// Registry with the built-in testnet token lists.
    pub fn builtin() -> Self {
        const USDC_LOGO: &str = "https://cryptologos.cc/logos/usd-coin-usdc-logo.png";
        const LINK_LOGO: &str = "https://cryptologos.cc/logos/chainlink-link-logo.png";
        const UNI_LOGO: &str = "https://cryptologos.cc/logos/uniswap-uni-logo.png";

        let mut tokens = BTreeMap::new();
        tokens.insert(
            SEPOLIA,
            vec![
                Token::builtin(
                    address!("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
                    "USDC",
                    "USD Coin (Testnet)",
                    6,
                    USDC_LOGO,
                    "usd-coin",
                ),
                Token::builtin(
                    address!("0x779877A7B0D9E8603169DdbD7836e478b4624789"),
                    "LINK",
                    "Chainlink Token",
                    18,
                    LINK_LOGO,
                    "chainlink",
                ),
                Token::builtin(
                    address!("0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984"),
                    "UNI",
                    "Uniswap",
                    18,
                    UNI_LOGO,
                    "uniswap",
                ),
            ],
        );
        tokens.insert(
            ARBITRUM_SEPOLIA,
            vec![
                Token::builtin(
                    address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d"),
                    "USDC",
                    "USD Coin (Arbitrum Sepolia)",
                    6,
                    USDC_LOGO,
                    "usd-coin",
                ),
                Token::builtin(
                    address!("0xb1D4538B4571d411F07960EF2838Ce337FE1E80E"),
                    "LINK",
                    "Chainlink Token",
                    18,
                    LINK_LOGO,
                    "chainlink",
                ),
                Token::builtin(
                    address!("0x4064DcC3A9DE3e8b8DE6C080740f1dEa7b1afF63"),
                    "UNI",
                    "Uniswap",
                    18,
                    UNI_LOGO,
                    "uniswap",
                ),
            ],
        );

        Self { tokens }
    }

    /// Add a token to a chain's list, replacing any entry with the same address.
    pub fn insert(&mut self, chain_id: u64, token: Token) -> Result<(), RegistryError> {
        if token.decimals > MAX_DECIMALS {
            return Err(RegistryError::InvalidDecimals {
                symbol: token.symbol,
                decimals: token.decimals,
            });
        }

        let list = self.tokens.entry(chain_id).or_default();
        match list.iter_mut().find(|t| t.address == token.address) {
            Some(existing) => *existing = token,
            None => list.push(token),
        }
        Ok(())
    }

    /// Tokens configured for `chain_id`; empty when the chain is unsupported.
    pub fn tokens(&self, chain_id: u64) -> &[Token] {
        self.tokens.get(&chain_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A chain is supported when it has at least one configured token.
    pub fn is_supported(&self, chain_id: u64) -> bool {
        !self.tokens(chain_id).is_empty()
    }

    /// Chain ids with a non-empty token list.
    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.tokens
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(id, _)| *id)
    }

    /// Find a token by symbol or address (case-insensitive).
    pub fn find(&self, chain_id: u64, query: &str) -> Result<&Token, RegistryError> {
        self.tokens(chain_id)
            .iter()
            .find(|t| t.matches(query))
            .ok_or_else(|| RegistryError::UnknownToken {
                chain_id,
                query: query.to_string(),
            })
    }
}

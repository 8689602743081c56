//! Static configuration for the token dashboard.
//!
//! This crate provides:
//! - Chain metadata (native currency, price feed id, block explorer)
//! - Per-chain token lists keyed by chain id
//! - Block explorer link construction

pub mod explorer;
pub mod network;
pub mod token;

pub use explorer::{explorer_url, ExplorerKind, DEFAULT_EXPLORER};
pub use network::{ChainConfig, ARBITRUM_SEPOLIA, SEPOLIA};
pub use token::{RegistryError, Token, TokenRegistry, WatchAssetOptions, WatchAssetRequest};

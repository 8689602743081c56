//! Wallet connection for the dashboard.
//!
//! Wraps alloy provider construction and exposes the connection state the
//! dashboard and transaction flows receive explicitly: who is connected and
//! on which chain.

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error connecting to the RPC endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// General error with context
    #[error("Client error: {0}")]
    Other(String),
}

/// Convenience function to create an ethereum rpc provider from url.
pub async fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Create a provider with wallet signing capability from a private key.
pub fn create_wallet_provider(
    rpc_url: &str,
    private_key: &str,
) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;

    let signer = parse_signer(private_key)?;
    let wallet = EthereumWallet::from(signer);

    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

    Ok(provider)
}

/// Address controlled by `private_key`.
pub fn signer_address(private_key: &str) -> Result<Address, ClientError> {
    Ok(parse_signer(private_key)?.address())
}

fn parse_signer(private_key: &str) -> Result<PrivateKeySigner, ClientError> {
    private_key
        .parse()
        .map_err(|e| ClientError::InvalidPrivateKey(format!("{}", e)))
}

/// Wallet connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected(Address),
}

/// Connection state plus the chain the wallet is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletContext {
    pub status: ConnectionStatus,
    pub chain_id: u64,
}

impl WalletContext {
    pub const fn new(status: ConnectionStatus, chain_id: u64) -> Self {
        Self { status, chain_id }
    }

    pub const fn disconnected(chain_id: u64) -> Self {
        Self::new(ConnectionStatus::Disconnected, chain_id)
    }

    pub const fn connected(account: Address, chain_id: u64) -> Self {
        Self::new(ConnectionStatus::Connected(account), chain_id)
    }

    /// Resolve the active chain from `provider`. `account` is the connected
    /// address, if any.
    pub async fn connect<P>(provider: &P, account: Option<Address>) -> Result<Self, ClientError>
    where
        P: Provider,
    {
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        debug!(chain_id, account = ?account, "Wallet context resolved");

        let status = match account {
            Some(address) => ConnectionStatus::Connected(address),
            None => ConnectionStatus::Disconnected,
        };
        Ok(Self::new(status, chain_id))
    }

    pub const fn account(&self) -> Option<Address> {
        match self.status {
            ConnectionStatus::Connected(address) => Some(address),
            _ => None,
        }
    }

    pub const fn is_connected(&self) -> bool {
        matches!(self.status, ConnectionStatus::Connected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known anvil development key #0.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_invalid_url() {
        let result = create_provider("not a url").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_signer_address() {
        let address = signer_address(DEV_KEY).unwrap();
        assert_eq!(
            address.to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(matches!(
            signer_address("0x1234"),
            Err(ClientError::InvalidPrivateKey(_))
        ));
        assert!(create_wallet_provider("http://localhost:8545", "nope").is_err());
    }

    #[test]
    fn test_wallet_context_account() {
        let account = Address::repeat_byte(7);
        let connected = WalletContext::connected(account, 11155111);
        assert_eq!(connected.account(), Some(account));
        assert!(connected.is_connected());

        let disconnected = WalletContext::disconnected(11155111);
        assert_eq!(disconnected.account(), None);

        let connecting = WalletContext::new(ConnectionStatus::Connecting, 1);
        assert!(!connecting.is_connected());
    }
}

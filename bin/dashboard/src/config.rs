use action::FlowPolicy;
use config::{Token, TokenRegistry};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint url
    pub rpc_url: String,

    /// CoinGecko demo API key
    #[serde(default)]
    pub coingecko_api_key: Option<String>,

    /// Seconds a fetched price is served without refetching
    #[serde(default = "default_price_secs")]
    pub price_stale_secs: u64,

    /// Seconds between background price refreshes in watch mode
    #[serde(default = "default_price_secs")]
    pub price_refresh_secs: u64,

    /// Milliseconds between transaction receipt polls
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    /// Prometheus exporter port
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default)]
    pub policy: FlowPolicy,

    /// Tokens added on top of the built-in lists
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// A configured token and the chain it lives on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub chain_id: u64,
    #[serde(flatten)]
    pub token: Token,
}

const fn default_price_secs() -> u64 {
    60
}

const fn default_receipt_poll_ms() -> u64 {
    4_000
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Built-in token lists extended with the configured tokens.
    pub fn registry(&self) -> eyre::Result<TokenRegistry> {
        let mut registry = TokenRegistry::builtin();
        for entry in &self.tokens {
            registry.insert(entry.chain_id, entry.token.clone())?;
        }
        Ok(registry)
    }

    pub const fn price_stale_after(&self) -> Duration {
        Duration::from_secs(self.price_stale_secs)
    }

    pub const fn price_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.price_refresh_secs)
    }

    pub const fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(r#"rpc_url = "http://localhost:8545""#).unwrap();

        assert_eq!(config.price_stale_after(), Duration::from_secs(60));
        assert_eq!(config.receipt_poll_interval(), Duration::from_secs(4));
        assert_eq!(config.policy, FlowPolicy::default());
        assert!(config.coingecko_api_key.is_none());
    }

    #[test]
    fn test_extra_tokens_extend_registry() {
        let config: Config = toml::from_str(
            r#"
            rpc_url = "http://localhost:8545"

            [policy]
            reset_before_raise = true

            [[tokens]]
            chain_id = 31337
            address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            symbol = "TST"
            name = "Test Token"
            decimals = 18
            logo = ""
            price_id = "test"
            "#,
        )
        .unwrap();

        assert!(config.policy.reset_before_raise);
        assert_eq!(config.policy.gas_limit_margin_percent, 110);

        let registry = config.registry().unwrap();
        assert_eq!(registry.find(31337, "tst").unwrap().name, "Test Token");
        assert!(registry.is_supported(config::SEPOLIA));
    }
}

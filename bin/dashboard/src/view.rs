//! What the dashboard shows for a wallet context, and the per-token card.

use alloy_primitives::{Address, U256};
use balance::{BalanceQuery, Monitor};
use client::{ConnectionStatus, WalletContext};
use config::{Token, TokenRegistry};
use price::{PriceCache, PriceFeed, PriceStatus};
use std::fmt;
use tracing::warn;
use units::{format_amount, format_change, format_crypto_value, format_price, to_f64};

/// Top-level dashboard state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    Loading,
    /// No wallet connected, whatever the chain
    ConnectPrompt,
    /// Connected to a chain without configured tokens
    UnsupportedNetwork { chain_id: u64 },
    Tokens { tokens: Vec<Token>, selected: Token },
}

/// Pick the view for `ctx`.
///
/// `selected` is a symbol or address; unknown or missing selections fall
/// back to the chain's first token.
pub fn resolve_view(
    ctx: &WalletContext,
    registry: &TokenRegistry,
    selected: Option<&str>,
) -> DashboardView {
    match ctx.status {
        ConnectionStatus::Connecting => return DashboardView::Loading,
        ConnectionStatus::Disconnected => return DashboardView::ConnectPrompt,
        ConnectionStatus::Connected(_) => {}
    }

    let tokens = registry.tokens(ctx.chain_id);
    let Some(first) = tokens.first() else {
        return DashboardView::UnsupportedNetwork {
            chain_id: ctx.chain_id,
        };
    };

    let selected = selected
        .and_then(|query| registry.find(ctx.chain_id, query).ok())
        .unwrap_or(first)
        .clone();

    DashboardView::Tokens {
        tokens: tokens.to_vec(),
        selected,
    }
}

/// One token's balance and market data.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenCard {
    pub token: Token,
    /// `None` while the balance is loading or could not be read
    pub balance: Option<U256>,
    pub price: PriceStatus,
}

impl TokenCard {
    /// Balance as a float, for valuation only.
    pub fn balance_f64(&self) -> Option<f64> {
        self.balance.map(|b| to_f64(b, self.token.decimals))
    }

    /// Approximate fiat value of the balance.
    pub fn usd_value(&self) -> Option<f64> {
        Some(self.price.price()? * self.balance_f64()?)
    }
}

impl fmt::Display for TokenCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.token.symbol, self.token.name)?;

        let price = match &self.price {
            PriceStatus::Loading => "Loading...".to_string(),
            status => {
                let snapshot = status.snapshot();
                let mut line = snapshot
                    .and_then(|s| s.price)
                    .map_or_else(|| "-".to_string(), format_price);
                if let Some(change) = snapshot.and_then(|s| s.change_24h) {
                    line.push_str("  ");
                    line.push_str(&format_change(change));
                }
                if status.is_stale() {
                    line.push_str("  (stale)");
                }
                line
            }
        };
        writeln!(f, "  Price:   {price}")?;

        match self.balance {
            Some(balance) => writeln!(
                f,
                "  Balance: {} {}",
                format_crypto_value(to_f64(balance, self.token.decimals), false),
                self.token.symbol
            )?,
            None => writeln!(f, "  Balance: Loading...")?,
        }

        let value = self
            .usd_value()
            .map_or_else(|| "-".to_string(), |v| format!("≈ {}", format_crypto_value(v, true)));
        write!(f, "  Value:   {value}")
    }
}

/// Load one card: the holder's balance and the token's price.
///
/// Failures do not abort the card; they leave the balance loading and the
/// price stale or unavailable.
pub async fn load_card<M, F>(
    monitor: &M,
    cache: &PriceCache<F>,
    token: &Token,
    owner: Address,
) -> TokenCard
where
    M: Monitor,
    F: PriceFeed,
{
    let query = BalanceQuery::ERC20Balance {
        token: token.address,
        holder: owner,
    };
    let balance = match monitor.query_balance(query).await {
        Ok(balance) => Some(balance.amount),
        Err(e) => {
            warn!(token = %token.symbol, error = %e, "Failed to load balance");
            None
        }
    };

    let price = match cache.get(&token.price_id).await {
        Ok(snapshot) => PriceStatus::Available(snapshot),
        Err(_) => cache.status(&token.price_id).await,
    };

    TokenCard {
        token: token.clone(),
        balance,
        price,
    }
}

/// Rebuild a card from the cache without fetching prices.
pub async fn refresh_card<M, F>(
    monitor: &M,
    cache: &PriceCache<F>,
    card: &TokenCard,
    owner: Address,
) -> TokenCard
where
    M: Monitor,
    F: PriceFeed,
{
    let query = BalanceQuery::ERC20Balance {
        token: card.token.address,
        holder: owner,
    };
    let balance = match monitor.query_balance(query).await {
        Ok(balance) => Some(balance.amount),
        Err(e) => {
            warn!(token = %card.token.symbol, error = %e, "Failed to refresh balance");
            card.balance
        }
    };

    TokenCard {
        token: card.token.clone(),
        balance,
        price: cache.status(&card.token.price_id).await,
    }
}

/// Plain-text balance with full precision, e.g. for the `allowance` command.
pub fn exact_amount(amount: U256, token: &Token) -> String {
    if amount == U256::MAX {
        return "unlimited".to_string();
    }
    format!("{} {}", format_amount(amount, token.decimals), token.symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use price::PriceSnapshot;

    fn usdc() -> Token {
        TokenRegistry::builtin()
            .find(config::SEPOLIA, "USDC")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_card_with_price_and_balance() {
        let card = TokenCard {
            token: usdc(),
            balance: Some(U256::from(1_234_500_000u64)),
            price: PriceStatus::Available(PriceSnapshot {
                price: Some(0.9998),
                change_24h: Some(-0.013),
            }),
        };

        let text = card.to_string();
        assert!(text.starts_with("USDC (USD Coin (Testnet))"));
        assert!(text.contains("Price:   $1.00  ▼ 0.01%"));
        assert!(text.contains("Balance: 1,234.50 USDC"));
        assert!(text.contains("Value:   ≈ $1,234.25"));
    }

    #[test]
    fn test_card_placeholders() {
        let card = TokenCard {
            token: usdc(),
            balance: None,
            price: PriceStatus::Unavailable("rate limited".to_string()),
        };

        let text = card.to_string();
        assert!(text.contains("Price:   -"));
        assert!(text.contains("Balance: Loading..."));
        assert!(text.contains("Value:   -"));
    }

    #[test]
    fn test_card_keeps_stale_price() {
        let card = TokenCard {
            token: usdc(),
            balance: Some(U256::from(2_000_000u64)),
            price: PriceStatus::Stale {
                snapshot: PriceSnapshot {
                    price: Some(1.0),
                    change_24h: None,
                },
                reason: "price API returned 429: rate limited".to_string(),
            },
        };

        assert_eq!(card.usd_value(), Some(2.0));
        assert!(card.to_string().contains("Price:   $1.00  (stale)"));
    }

    #[test]
    fn test_exact_amount() {
        let token = usdc();
        assert_eq!(exact_amount(U256::from(1_500_000u64), &token), "1.5 USDC");
        assert_eq!(exact_amount(U256::MAX, &token), "unlimited");
    }
}

pub mod config;
pub mod metrics;
pub mod terminal;
pub mod view;

pub use view::{load_card, refresh_card, resolve_view, DashboardView, TokenCard};

use alloy_primitives::Address;
use alloy_provider::Provider;
use balance::{monitor::BalanceMonitor, Balance, BalanceQuery, Monitor};

pub async fn check_token_balance<P>(
    monitor: &BalanceMonitor<P>,
    token: Address,
    holder: Address,
) -> eyre::Result<Balance>
where
    P: Provider + Clone,
{
    let query = BalanceQuery::ERC20Balance { token, holder };
    let balance = monitor.query_balance(query).await?;

    Ok(balance)
}

pub async fn check_native_balance<P>(
    monitor: &BalanceMonitor<P>,
    address: Address,
) -> eyre::Result<Balance>
where
    P: Provider + Clone,
{
    let query = BalanceQuery::NativeBalance { address };
    let balance = monitor.query_balance(query).await?;
    Ok(balance)
}

pub async fn check_allowance<P>(
    monitor: &BalanceMonitor<P>,
    token: Address,
    owner: Address,
    spender: Address,
) -> eyre::Result<Balance>
where
    P: Provider + Clone,
{
    let query = BalanceQuery::Allowance {
        token,
        owner,
        spender,
    };
    let balance = monitor.query_balance(query).await?;
    Ok(balance)
}

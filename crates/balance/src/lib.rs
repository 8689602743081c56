//! Balance and allowance lookups for wallet accounts.
//!
//! This crate provides a high-level interface for querying ERC20 balances,
//! native balances and ERC20 allowances from a blockchain provider.

pub mod monitor;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Represents a blockchain balance at a specific point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The address holding the balance (the owner, for allowances)
    pub holder: Address,
    /// The asset address (zero address for native token)
    pub asset: Address,
    /// The balance amount
    pub amount: U256,
}

/// Type of balance query to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceQuery {
    /// Query ERC20 token balance for an EOA or contract
    ERC20Balance {
        /// Token contract address
        token: Address,
        /// Holder address
        holder: Address,
    },
    /// Query native balance
    NativeBalance {
        /// Account address
        address: Address,
    },
    /// Query the amount `spender` may transfer on behalf of `owner`
    ///
    /// Calls `ERC20.allowance(owner, spender)`.
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
    },
}

/// Trait for monitoring balances on a blockchain.
pub trait Monitor: Send + Sync {
    /// Query a single balance.
    fn query_balance(
        &self,
        query: BalanceQuery,
    ) -> impl Future<Output = eyre::Result<Balance>> + Send;
}

//! Transaction flows for ERC20 transfers and approvals.
//!
//! Each flow is a short state machine (see [`TxState`]) driven by user input
//! and by receipt polling. Everything the flows need from the outside world is
//! injected: chain access through [`TokenChain`], the wallet signature prompt
//! through [`SignaturePrompt`], and user-facing notices through [`Notifier`].

pub mod approve;
pub mod chain;
pub mod gas;
pub mod lifecycle;
pub mod notify;
pub mod policy;
pub mod transfer;

pub use approve::{ApproveFlow, ApproveIntent, ApproveOutcome};
pub use chain::ProviderChain;
pub use gas::GasCostEstimate;
pub use lifecycle::{ReceiptUpdate, TxState};
pub use notify::{NotificationGuard, Outcome};
pub use policy::FlowPolicy;
pub use transfer::{TransferFlow, TransferIntent};

use alloy_primitives::{Address, Bytes, TxHash, U256};
use serde::Serialize;
use std::{fmt, future::Future};
use thiserror::Error;

/// Failure reported by the chain or the wallet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The user declined to sign.
    #[error("User rejected the request.")]
    Rejected,

    /// Contract logic reverted (during simulation or on-chain).
    #[error("Execution reverted: {0}")]
    Reverted(String),

    /// Transport or node failure.
    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Inline form errors. A `None` field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    /// Recipient or spender address error
    pub address: Option<&'static str>,
    pub amount: Option<&'static str>,
}

impl FormErrors {
    pub const fn is_empty(&self) -> bool {
        self.address.is_none() && self.amount.is_none()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.address, self.amount].into_iter().flatten().collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("wallet is not connected")]
    Disconnected,

    #[error("{0}")]
    Form(FormErrors),

    #[error("transfer is not ready to simulate")]
    NotReady,

    #[error("transfer has not been simulated")]
    NotSimulated,

    #[error("simulation failed: {0}")]
    SimulationFailed(String),

    #[error("a transaction is already in progress")]
    Busy,

    #[error("no transaction is awaiting confirmation")]
    NothingPending,

    #[error("current allowance {current} must be reset to zero before raising it")]
    ResetRequired { current: U256 },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Successful dry run of a contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    /// Gas limit the node estimated for the call
    pub gas_limit: u64,
}

/// A contract call ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    /// Explicit gas limit; the wallet fills it when `None`
    pub gas_limit: Option<u64>,
}

/// Mined status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReceiptInfo {
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Contract-interaction surface used by the flows.
pub trait TokenChain: Send + Sync {
    fn balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Dry-run `transfer(to, amount)` from `from`.
    fn simulate_transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> impl Future<Output = Result<Simulation, ChainError>> + Send;

    fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send;

    /// Current max fee per gas unit, in wei.
    fn max_fee_per_gas(&self) -> impl Future<Output = Result<u128, ChainError>> + Send;

    /// Sign and broadcast; resolves once the node accepted the transaction.
    fn send_transaction(
        &self,
        request: CallRequest,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    /// Receipt of `hash`, or `None` while it is not mined.
    fn receipt(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<ReceiptInfo>, ChainError>> + Send;
}

/// Asks the wallet holder to sign a transaction.
pub trait SignaturePrompt: Send + Sync {
    /// Returns false when the user declines.
    fn confirm(&self, summary: &TxSummary) -> impl Future<Output = bool> + Send;
}

/// What the user is asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxSummary {
    Transfer {
        symbol: String,
        amount: String,
        recipient: Address,
        gas_limit: u64,
    },
    Approve {
        symbol: String,
        amount: String,
        spender: Address,
    },
}

impl fmt::Display for TxSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer {
                symbol,
                amount,
                recipient,
                gas_limit,
            } => write!(
                f,
                "Transfer {amount} {symbol} to {recipient} (gas limit {gas_limit})"
            ),
            Self::Approve {
                symbol,
                amount,
                spender,
            } => write!(f, "Approve {spender} to spend {amount} {symbol}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Explorer link, if any
    pub link: Option<String>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            link: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            link: None,
        }
    }

    pub fn success(message: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            link: Some(link.into()),
        }
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

//! Amount, address and display helpers shared by the dashboard and the
//! transaction flows.
//!
//! Amount strings go through two patterns: a lax one that tolerates
//! half-typed input such as `"12."`, and a strict one that must match before
//! anything is parsed into on-chain units.

mod address;
mod amount;
mod display;

pub use address::{is_address, parse_address};
pub use amount::{
    format_amount, is_parsable_amount, is_ui_amount, matches_lax_pattern, parse_amount,
    to_f64, PARSABLE_AMOUNT_PATTERN, UI_AMOUNT_PATTERN,
};
pub use display::{format_change, format_crypto_value, format_price};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("invalid amount format: {0:?}")]
    InvalidFormat(String),

    #[error("amount {0} does not fit in 256 bits")]
    Overflow(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

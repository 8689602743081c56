//! Contract bindings for the token contracts the dashboard talks to.
//!
//! Bindings are generated with alloy's `sol!` macro. Calldata helpers live next
//! to the interface so callers never hand-assemble selectors.

pub mod token;

pub use token::{approve_calldata, transfer_calldata, IERC20};

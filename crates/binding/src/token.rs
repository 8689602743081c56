//! ERC20 token contract bindings.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    /// Standard ERC20 token interface
    #[sol(rpc)]
    interface IERC20 {
        /// Emitted when tokens are transferred
        event Transfer(
            address indexed from,
            address indexed to,
            uint256 value
        );

        /// Emitted when an allowance is set
        event Approval(
            address indexed owner,
            address indexed spender,
            uint256 value
        );

        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Approve spender to spend tokens
        function approve(address spender, uint256 amount) external returns (bool);

        /// Transfer tokens to recipient
        function transfer(address recipient, uint256 amount) external returns (bool);

        /// Transfer tokens from sender to recipient (requires allowance)
        function transferFrom(address sender, address recipient, uint256 amount) external returns (bool);

        function name() external view returns (string memory);

        function symbol() external view returns (string memory);

        function decimals() external view returns (uint8);

        function totalSupply() external view returns (uint256);
    }
}

/// ABI-encoded `transfer(recipient, amount)` calldata.
pub fn transfer_calldata(recipient: Address, amount: U256) -> Bytes {
    IERC20::transferCall { recipient, amount }.abi_encode().into()
}

/// ABI-encoded `approve(spender, amount)` calldata.
pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_calldata_layout() {
        let recipient = Address::repeat_byte(0xab);
        let data = transfer_calldata(recipient, U256::from(1_500_000u64));

        // selector + two 32-byte words
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], IERC20::transferCall::SELECTOR.as_slice());
        assert_eq!(&data[16..36], recipient.as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(1_500_000u64));
    }

    #[test]
    fn test_approve_calldata_decodes() {
        let spender = Address::repeat_byte(0x11);
        let data = approve_calldata(spender, U256::MAX);

        let decoded = IERC20::approveCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.spender, spender);
        assert_eq!(decoded.amount, U256::MAX);
    }
}

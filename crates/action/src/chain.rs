//! [`TokenChain`] on top of an alloy provider.

use crate::{CallRequest, ChainError, ReceiptInfo, Simulation, TokenChain};
use alloy_network::{ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::decode_revert_reason;
use alloy_transport::TransportError;
use balance::{monitor::BalanceMonitor, BalanceQuery, Monitor};
use binding::IERC20;
use tracing::debug;

/// EIP-1193 "User Rejected Request".
const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone)]
pub struct ProviderChain<P> {
    provider: P,
    monitor: BalanceMonitor<P>,
}

impl<P> ProviderChain<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P) -> Self {
        Self {
            monitor: BalanceMonitor::new(provider.clone()),
            provider,
        }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    async fn query(&self, query: BalanceQuery) -> Result<U256, ChainError> {
        self.monitor
            .query_balance(query)
            .await
            .map(|balance| balance.amount)
            .map_err(|e| classify_report(&e))
    }
}

impl<P> TokenChain for ProviderChain<P>
where
    P: Provider + Clone,
{
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.query(BalanceQuery::ERC20Balance {
            token,
            holder: owner,
        })
        .await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.query(BalanceQuery::Allowance {
            token,
            owner,
            spender,
        })
        .await
    }

    async fn simulate_transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<Simulation, ChainError> {
        let contract = IERC20::new(token, &self.provider);
        let call = contract.transfer(to, amount).from(from);

        let accepted = call.call().await.map_err(|e| classify_contract_error(&e))?;
        if !accepted {
            return Err(ChainError::Reverted("transfer returned false".to_string()));
        }

        let gas_limit = call
            .estimate_gas()
            .await
            .map_err(|e| classify_contract_error(&e))?;
        debug!(%token, %from, %to, %amount, gas_limit, "Simulated transfer");

        Ok(Simulation { gas_limit })
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> Result<u64, ChainError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data);

        self.provider
            .estimate_gas(tx)
            .await
            .map_err(|e| classify_transport_error(&e))
    }

    async fn max_fee_per_gas(&self) -> Result<u128, ChainError> {
        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(|e| classify_transport_error(&e))?;
        Ok(fees.max_fee_per_gas)
    }

    async fn send_transaction(&self, request: CallRequest) -> Result<TxHash, ChainError> {
        let mut tx = TransactionRequest::default()
            .with_from(request.from)
            .with_to(request.to)
            .with_input(request.data);
        if let Some(gas_limit) = request.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| classify_transport_error(&e))?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptInfo>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| classify_transport_error(&e))?;

        Ok(receipt.map(|r| ReceiptInfo {
            success: r.status(),
            block_number: r.block_number(),
            gas_used: r.gas_used(),
        }))
    }
}

/// Map an RPC failure to what the user should be told.
pub fn classify_transport_error(error: &TransportError) -> ChainError {
    if let Some(payload) = error.as_error_resp() {
        if payload.code == USER_REJECTED_CODE {
            return ChainError::Rejected;
        }
        if let Some(reason) = payload
            .as_revert_data()
            .and_then(|data| decode_revert_reason(&data))
        {
            return ChainError::Reverted(reason);
        }
        return classify_message(&payload.message);
    }
    classify_message(&error.to_string())
}

pub fn classify_contract_error(error: &alloy_contract::Error) -> ChainError {
    match error {
        alloy_contract::Error::TransportError(e) => classify_transport_error(e),
        other => classify_message(&other.to_string()),
    }
}

fn classify_report(report: &eyre::Report) -> ChainError {
    match report.downcast_ref::<alloy_contract::Error>() {
        Some(e) => classify_contract_error(e),
        None => match report.downcast_ref::<TransportError>() {
            Some(e) => classify_transport_error(e),
            None => classify_message(&report.to_string()),
        },
    }
}

/// Classify by message text when no structured payload is available.
pub fn classify_message(message: &str) -> ChainError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("user rejected") || lower.contains("user denied") {
        ChainError::Rejected
    } else if let Some(idx) = lower.find("execution reverted") {
        let reason = message[idx + "execution reverted".len()..]
            .trim_start_matches(':')
            .trim();
        let reason = if reason.is_empty() {
            "execution reverted"
        } else {
            reason
        };
        ChainError::Reverted(reason.to_string())
    } else {
        ChainError::Rpc(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            classify_message("MetaMask Tx Signature: User denied transaction signature."),
            ChainError::Rejected
        );
        assert_eq!(
            classify_message("User rejected the request."),
            ChainError::Rejected
        );
    }

    #[test]
    fn test_revert_reason_extracted() {
        assert_eq!(
            classify_message("execution reverted: ERC20: transfer amount exceeds balance"),
            ChainError::Reverted("ERC20: transfer amount exceeds balance".to_string())
        );
        assert_eq!(
            classify_message("execution reverted"),
            ChainError::Reverted("execution reverted".to_string())
        );
    }

    #[test]
    fn test_other_errors_are_rpc() {
        assert_eq!(
            classify_message("nonce too low"),
            ChainError::Rpc("nonce too low".to_string())
        );
    }

    #[test]
    fn test_report_without_alloy_error() {
        let report = eyre::eyre!("connection refused");
        assert_eq!(
            classify_report(&report),
            ChainError::Rpc("connection refused".to_string())
        );
    }
}

//! ERC20 transfer flow.
//!
//! The intent is validated inline, dry-run simulated, and only then offered
//! for signature. The gas limit from the simulation is inflated by the policy
//! margin before submitting.

use crate::{
    gas::GasCostEstimate,
    lifecycle::{Messages, ReceiptUpdate, TxLifecycle, TxState},
    notify::Outcome,
    CallRequest, ChainError, FlowError, FlowPolicy, FormErrors, Notifier, SignaturePrompt,
    Simulation, TokenChain, TxSummary,
};
use alloy_primitives::{Address, TxHash, U256};
use binding::transfer_calldata;
use client::WalletContext;
use config::Token;
use std::time::Duration;
use tracing::{debug, warn};
use units::{format_amount, is_parsable_amount, is_ui_amount, parse_address, parse_amount, to_f64};

const MESSAGES: Messages = Messages {
    success: "Transfer successful!",
    reverted: "Transaction failed on-chain.",
};

/// A validated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub recipient: Address,
    pub amount: U256,
}

#[derive(Debug, Clone)]
enum SimulationResult {
    Ok(TransferIntent, Simulation),
    Failed(TransferIntent, String),
}

pub struct TransferFlow<C, N> {
    chain: C,
    lifecycle: TxLifecycle<N>,
    policy: FlowPolicy,
    token: Token,
    owner: Address,
    balance: Option<U256>,
    recipient: String,
    amount: String,
    errors: FormErrors,
    simulation: Option<SimulationResult>,
}

impl<C, N> TransferFlow<C, N>
where
    C: TokenChain,
    N: Notifier,
{
    /// Start a transfer of `token` for the connected account.
    ///
    /// `balance` is the last known on-chain balance, if it was loaded.
    pub fn new(
        chain: C,
        notifier: N,
        ctx: &WalletContext,
        token: Token,
        balance: Option<U256>,
        policy: FlowPolicy,
    ) -> Result<Self, FlowError> {
        let owner = ctx.account().ok_or(FlowError::Disconnected)?;
        Ok(Self {
            chain,
            lifecycle: TxLifecycle::new(notifier, ctx.chain_id, MESSAGES),
            policy,
            token,
            owner,
            balance,
            recipient: String::new(),
            amount: String::new(),
            errors: FormErrors::default(),
            simulation: None,
        })
    }

    pub const fn token(&self) -> &Token {
        &self.token
    }

    pub const fn balance(&self) -> Option<U256> {
        self.balance
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub const fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub const fn state(&self) -> &TxState {
        self.lifecycle.state()
    }

    /// The dialog may only be dismissed when nothing is outstanding.
    pub const fn can_close(&self) -> bool {
        !self.lifecycle.is_busy()
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.recipient = recipient.into();
        self.errors.address = None;
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
        self.errors.amount = None;
    }

    /// Fill the amount with the full balance. No-op without a positive balance.
    pub fn max_amount(&mut self) {
        if let Some(balance) = self.balance.filter(|b| !b.is_zero()) {
            self.amount = format_amount(balance, self.token.decimals);
            self.errors = FormErrors::default();
        }
    }

    /// Amount in token units, or zero when it does not parse.
    pub fn parsed_amount(&self) -> U256 {
        if is_parsable_amount(&self.amount) {
            parse_amount(&self.amount, self.token.decimals).unwrap_or_default()
        } else {
            U256::ZERO
        }
    }

    /// The current input as an intent, if it is complete enough to simulate.
    pub fn intent(&self) -> Option<TransferIntent> {
        let recipient = parse_address(&self.recipient).ok()?;
        let amount = self.parsed_amount();
        (!amount.is_zero()).then_some(TransferIntent { recipient, amount })
    }

    /// Whether simulation may run for the current input.
    pub fn is_ready(&self) -> bool {
        self.intent().is_some()
    }

    /// Check the form and record inline errors.
    pub fn validate(&mut self) -> Result<TransferIntent, FormErrors> {
        let mut errors = FormErrors::default();

        let recipient = if self.recipient.is_empty() {
            errors.address = Some("Recipient address is required");
            None
        } else {
            let parsed = parse_address(&self.recipient).ok();
            if parsed.is_none() {
                errors.address = Some("Invalid Ethereum address");
            }
            parsed
        };

        let amount = if self.amount.is_empty() {
            errors.amount = Some("Amount is required");
            None
        } else if !is_ui_amount(&self.amount) {
            errors.amount = Some("Invalid amount format");
            None
        } else {
            match parse_amount(&self.amount, self.token.decimals) {
                Err(_) => {
                    errors.amount = Some("Invalid amount format");
                    None
                }
                Ok(amount) if amount.is_zero() => {
                    errors.amount = Some("Amount must be greater than 0");
                    None
                }
                Ok(amount) if amount > self.balance.unwrap_or_default() => {
                    errors.amount = Some("Insufficient balance");
                    None
                }
                Ok(amount) => Some(amount),
            }
        };

        self.errors = errors.clone();
        match (recipient, amount) {
            (Some(recipient), Some(amount)) if errors.is_empty() => {
                Ok(TransferIntent { recipient, amount })
            }
            _ => Err(errors),
        }
    }

    /// Dry-run the current intent against the token contract.
    ///
    /// A revert is stored and disables submission until the input changes.
    pub async fn simulate(&mut self) -> Result<Simulation, FlowError> {
        let intent = self.intent().ok_or(FlowError::NotReady)?;

        let result = self
            .chain
            .simulate_transfer(self.token.address, self.owner, intent.recipient, intent.amount)
            .await;

        match result {
            Ok(simulation) => {
                debug!(gas_limit = simulation.gas_limit, "Transfer simulation succeeded");
                self.simulation = Some(SimulationResult::Ok(intent, simulation));
                Ok(simulation)
            }
            Err(e) => {
                let reason = match &e {
                    ChainError::Reverted(reason) => reason.clone(),
                    other => other.to_string(),
                };
                warn!(reason = %reason, "Transfer simulation failed");
                self.simulation = Some(SimulationResult::Failed(intent, reason.clone()));
                Err(FlowError::SimulationFailed(reason))
            }
        }
    }

    /// Successful simulation of the current input, if any.
    pub fn simulation(&self) -> Option<Simulation> {
        let intent = self.intent()?;
        match &self.simulation {
            Some(SimulationResult::Ok(simulated, simulation)) if *simulated == intent => {
                Some(*simulation)
            }
            _ => None,
        }
    }

    /// Revert reason of the current input's simulation. Hidden while the
    /// form itself has errors.
    pub fn simulation_error(&self) -> Option<&str> {
        if !self.errors.is_empty() {
            return None;
        }
        let intent = self.intent()?;
        match &self.simulation {
            Some(SimulationResult::Failed(simulated, reason)) if *simulated == intent => {
                Some(reason.as_str())
            }
            _ => None,
        }
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.lifecycle.is_busy()
            || self.simulation().is_none()
            || self.recipient.is_empty()
            || self.amount.is_empty()
    }

    /// Approximate fiat value of the entered amount.
    pub fn usd_preview(&self, price: Option<f64>) -> Option<f64> {
        let amount = self.parsed_amount();
        if amount.is_zero() {
            return None;
        }
        price.map(|p| p * to_f64(amount, self.token.decimals))
    }

    /// Estimated gas cost of the current input, for display only.
    ///
    /// Returns `None` when the input is not ready to estimate.
    pub async fn estimate_gas_cost(
        &self,
        native_price: Option<f64>,
    ) -> Result<Option<GasCostEstimate>, ChainError> {
        let Some(intent) = self.intent() else {
            return Ok(None);
        };

        let data = transfer_calldata(intent.recipient, intent.amount);
        let gas_units = self
            .chain
            .estimate_gas(self.owner, self.token.address, data)
            .await?;
        let fee_per_gas = self.chain.max_fee_per_gas().await?;

        Ok(Some(GasCostEstimate::new(
            gas_units,
            fee_per_gas,
            self.policy.gas_display_buffer_percent,
            native_price,
        )))
    }

    /// Validate, check the simulation, prompt for a signature and broadcast.
    pub async fn submit<S>(&mut self, prompt: &S) -> Result<TxHash, FlowError>
    where
        S: SignaturePrompt,
    {
        if self.lifecycle.is_busy() {
            return Err(FlowError::Busy);
        }

        let intent = self.validate().map_err(FlowError::Form)?;
        let simulation = match &self.simulation {
            Some(SimulationResult::Ok(simulated, simulation)) if *simulated == intent => {
                *simulation
            }
            Some(SimulationResult::Failed(simulated, reason)) if *simulated == intent => {
                return Err(FlowError::SimulationFailed(reason.clone()));
            }
            _ => return Err(FlowError::NotSimulated),
        };

        let gas_limit = self.policy.apply_gas_margin(simulation.gas_limit);
        let request = CallRequest {
            from: self.owner,
            to: self.token.address,
            data: transfer_calldata(intent.recipient, intent.amount),
            gas_limit: Some(gas_limit),
        };
        let summary = TxSummary::Transfer {
            symbol: self.token.symbol.clone(),
            amount: format_amount(intent.amount, self.token.decimals),
            recipient: intent.recipient,
            gas_limit,
        };

        self.lifecycle.send(&self.chain, prompt, summary, request).await
    }

    /// Apply one receipt-polling update.
    pub fn handle_receipt(&mut self, update: ReceiptUpdate) -> Option<Outcome> {
        self.lifecycle.apply(update)
    }

    /// Poll the receipt once. A confirmed transfer re-reads the balance.
    pub async fn poll_receipt(&mut self) -> Result<Option<Outcome>, FlowError> {
        let outcome = self.lifecycle.poll(&self.chain).await?;
        if outcome == Some(Outcome::Success) {
            if let Err(e) = self.refresh_balance().await {
                warn!(error = %e, "Failed to refresh balance after transfer");
            }
        }
        Ok(outcome)
    }

    /// Poll every `every` until the transaction is confirmed or failed.
    pub async fn wait_for_receipt(&mut self, every: Duration) -> Result<Outcome, FlowError> {
        loop {
            if let Some(outcome) = self.poll_receipt().await? {
                return Ok(outcome);
            }
            tokio::time::sleep(every).await;
        }
    }

    pub async fn refresh_balance(&mut self) -> Result<U256, ChainError> {
        let balance = self
            .chain
            .balance_of(self.token.address, self.owner)
            .await?;
        self.balance = Some(balance);
        Ok(balance)
    }

    /// Start over after a terminal state, keeping the inputs.
    pub fn reset(&mut self) {
        self.lifecycle.reset();
    }
}

//! ERC20 allowance flow.

use crate::{
    lifecycle::{Messages, ReceiptUpdate, TxLifecycle, TxState},
    notify::Outcome,
    CallRequest, ChainError, FlowError, FlowPolicy, FormErrors, Notice, Notifier,
    SignaturePrompt, TokenChain, TxSummary,
};
use alloy_primitives::{Address, TxHash, U256};
use binding::approve_calldata;
use client::WalletContext;
use config::Token;
use std::time::Duration;
use tracing::{debug, info, warn};
use units::{format_amount, is_ui_amount, parse_address, parse_amount};

const MESSAGES: Messages = Messages {
    success: "Approval Confirmed!",
    reverted: "Transaction failed on-chain",
};

/// A validated approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproveIntent {
    pub spender: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    /// The current allowance already covers the request; nothing was sent.
    AlreadySufficient,
    Submitted(TxHash),
}

pub struct ApproveFlow<C, N> {
    chain: C,
    lifecycle: TxLifecycle<N>,
    policy: FlowPolicy,
    token: Token,
    owner: Address,
    spender: String,
    amount: String,
    errors: FormErrors,
    /// Last fetched allowance and the spender it belongs to
    allowance: Option<(Address, U256)>,
}

impl<C, N> ApproveFlow<C, N>
where
    C: TokenChain,
    N: Notifier,
{
    pub fn new(
        chain: C,
        notifier: N,
        ctx: &WalletContext,
        token: Token,
        policy: FlowPolicy,
    ) -> Result<Self, FlowError> {
        let owner = ctx.account().ok_or(FlowError::Disconnected)?;
        Ok(Self {
            chain,
            lifecycle: TxLifecycle::new(notifier, ctx.chain_id, MESSAGES),
            policy,
            token,
            owner,
            spender: String::new(),
            amount: String::new(),
            errors: FormErrors::default(),
            allowance: None,
        })
    }

    pub const fn token(&self) -> &Token {
        &self.token
    }

    pub fn spender(&self) -> &str {
        &self.spender
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

    pub const fn can_close(&self) -> bool {
        !self.lifecycle.is_busy()
    }

    pub fn set_spender(&mut self, spender: impl Into<String>) {
        self.spender = spender.into();
        self.errors.address = None;
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
        self.errors.amount = None;
    }

    /// Request the maximum possible allowance.
    pub fn set_unlimited(&mut self) {
        self.set_amount(format_amount(U256::MAX, self.token.decimals));
    }

    fn spender_address(&self) -> Option<Address> {
        parse_address(&self.spender).ok()
    }

    /// Entered amount in token units. A trailing dot is accepted here.
    fn entered_amount(&self) -> Option<U256> {
        if !is_ui_amount(&self.amount) {
            return None;
        }
        let normalized = self.amount.strip_suffix('.').unwrap_or(&self.amount);
        let normalized = if normalized.is_empty() { "0" } else { normalized };
        parse_amount(normalized, self.token.decimals).ok()
    }

    /// Allowance fetched for the spender currently entered.
    pub fn current_allowance(&self) -> Option<U256> {
        let spender = self.spender_address()?;
        self.allowance
            .filter(|(fetched_for, _)| *fetched_for == spender)
            .map(|(_, amount)| amount)
    }

    /// Read the allowance of the entered spender.
    pub async fn refresh_allowance(&mut self) -> Result<Option<U256>, ChainError> {
        let Some(spender) = self.spender_address() else {
            return Ok(None);
        };
        let amount = self
            .chain
            .allowance(self.token.address, self.owner, spender)
            .await?;
        debug!(%spender, %amount, "Fetched allowance");
        self.allowance = Some((spender, amount));
        Ok(Some(amount))
    }

    /// The fetched allowance already covers the entered amount.
    pub fn is_already_sufficient(&self) -> bool {
        match (self.entered_amount(), self.current_allowance()) {
            (Some(requested), Some(current)) => current >= requested,
            _ => false,
        }
    }

    pub fn validate(&mut self) -> Result<ApproveIntent, FormErrors> {
        let mut errors = FormErrors::default();

        let spender = self.spender_address();
        if spender.is_none() {
            errors.address = Some("Invalid address");
        }
        let amount = self.entered_amount();
        if amount.is_none() {
            errors.amount = Some("Invalid amount");
        }

        self.errors = errors.clone();
        match (spender, amount) {
            (Some(spender), Some(amount)) => Ok(ApproveIntent { spender, amount }),
            _ => Err(errors),
        }
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.lifecycle.is_busy() || self.spender.is_empty() || self.amount.is_empty()
    }

    /// A non-zero allowance exists for the entered spender.
    pub fn can_reset(&self) -> bool {
        !self.lifecycle.is_busy() && self.current_allowance().is_some_and(|a| !a.is_zero())
    }

    /// Validate and request the approval, unless the allowance already covers it.
    ///
    /// The allowance of the entered spender is read first if it was not
    /// fetched yet. A failed read is logged and the approval goes ahead.
    pub async fn submit<S>(&mut self, prompt: &S) -> Result<ApproveOutcome, FlowError>
    where
        S: SignaturePrompt,
    {
        if self.lifecycle.is_busy() {
            return Err(FlowError::Busy);
        }

        let intent = self.validate().map_err(FlowError::Form)?;
        if self.current_allowance().is_none() {
            if let Err(e) = self.refresh_allowance().await {
                warn!(spender = %intent.spender, error = %e, "Failed to read allowance before approval");
            }
        }

        if self.is_already_sufficient() {
            info!(spender = %intent.spender, "Allowance is already sufficient");
            self.lifecycle
                .notify(Notice::info("Allowance is already sufficient."));
            return Ok(ApproveOutcome::AlreadySufficient);
        }

        if self.policy.reset_before_raise {
            if let Some(current) = self.current_allowance().filter(|a| !a.is_zero()) {
                return Err(FlowError::ResetRequired { current });
            }
        }

        let hash = self.send(prompt, intent).await?;
        Ok(ApproveOutcome::Submitted(hash))
    }

    /// Set the entered spender's allowance back to zero.
    pub async fn reset_to_zero<S>(&mut self, prompt: &S) -> Result<TxHash, FlowError>
    where
        S: SignaturePrompt,
    {
        let spender = self.spender_address().ok_or_else(|| {
            self.errors.address = Some("Invalid address");
            FlowError::Form(self.errors.clone())
        })?;

        self.send(
            prompt,
            ApproveIntent {
                spender,
                amount: U256::ZERO,
            },
        )
        .await
    }

    async fn send<S>(&mut self, prompt: &S, intent: ApproveIntent) -> Result<TxHash, FlowError>
    where
        S: SignaturePrompt,
    {
        let request = CallRequest {
            from: self.owner,
            to: self.token.address,
            data: approve_calldata(intent.spender, intent.amount),
            gas_limit: None,
        };
        let amount = if intent.amount == U256::MAX {
            "unlimited".to_string()
        } else {
            format_amount(intent.amount, self.token.decimals)
        };
        let summary = TxSummary::Approve {
            symbol: self.token.symbol.clone(),
            amount,
            spender: intent.spender,
        };

        self.lifecycle.send(&self.chain, prompt, summary, request).await
    }

    pub fn handle_receipt(&mut self, update: ReceiptUpdate) -> Option<Outcome> {
        self.lifecycle.apply(update)
    }

    /// Poll the receipt once. A confirmed approval re-reads the allowance.
    pub async fn poll_receipt(&mut self) -> Result<Option<Outcome>, FlowError> {
        let outcome = self.lifecycle.poll(&self.chain).await?;
        if outcome == Some(Outcome::Success) {
            if let Err(e) = self.refresh_allowance().await {
                warn!(error = %e, "Failed to refresh allowance after approval");
            }
        }
        Ok(outcome)
    }

    pub async fn wait_for_receipt(&mut self, every: Duration) -> Result<Outcome, FlowError> {
        loop {
            if let Some(outcome) = self.poll_receipt().await? {
                return Ok(outcome);
            }
            tokio::time::sleep(every).await;
        }
    }

    pub fn reset(&mut self) {
        self.lifecycle.reset();
    }
}

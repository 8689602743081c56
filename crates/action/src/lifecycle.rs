//! Shared transaction lifecycle for the transfer and approve flows.
//!
//! `Editing → AwaitingSignature → AwaitingConfirmation → Confirmed | Failed`.
//! A wallet rejection or send error goes back to `Editing`. Terminal notices
//! pass through a [`NotificationGuard`] so each hash is announced at most once.

use crate::{
    notify::{NotificationGuard, Outcome},
    CallRequest, ChainError, FlowError, Notice, Notifier, ReceiptInfo, SignaturePrompt,
    TokenChain, TxSummary,
};
use alloy_primitives::TxHash;
use config::{explorer_url, ExplorerKind};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TxState {
    Editing,
    AwaitingSignature,
    AwaitingConfirmation { hash: TxHash },
    Confirmed { hash: TxHash, receipt: ReceiptInfo },
    Failed { hash: TxHash, reason: String },
}

impl TxState {
    /// A signature or confirmation is outstanding.
    pub const fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::AwaitingSignature | Self::AwaitingConfirmation { .. }
        )
    }

    pub const fn hash(&self) -> Option<TxHash> {
        match self {
            Self::AwaitingConfirmation { hash }
            | Self::Confirmed { hash, .. }
            | Self::Failed { hash, .. } => Some(*hash),
            Self::Editing | Self::AwaitingSignature => None,
        }
    }
}

/// One result of polling for a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptUpdate {
    /// Not mined yet
    Pending,
    Mined(ReceiptInfo),
    /// Waiting for the receipt failed
    Error(String),
}

/// Notice wording for one flow.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Messages {
    pub success: &'static str,
    pub reverted: &'static str,
}

pub(crate) struct TxLifecycle<N> {
    state: TxState,
    guard: NotificationGuard,
    notifier: N,
    chain_id: u64,
    messages: Messages,
}

impl<N> TxLifecycle<N>
where
    N: Notifier,
{
    pub(crate) fn new(notifier: N, chain_id: u64, messages: Messages) -> Self {
        Self {
            state: TxState::Editing,
            guard: NotificationGuard::new(),
            notifier,
            chain_id,
            messages,
        }
    }

    pub(crate) const fn state(&self) -> &TxState {
        &self.state
    }

    pub(crate) const fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Return to `Editing` after a terminal state. Ignored while busy.
    pub(crate) fn reset(&mut self) {
        if !self.is_busy() {
            self.state = TxState::Editing;
        }
    }

    /// Prompt for a signature and broadcast `request`.
    pub(crate) async fn send<C, S>(
        &mut self,
        chain: &C,
        prompt: &S,
        summary: TxSummary,
        request: CallRequest,
    ) -> Result<TxHash, FlowError>
    where
        C: TokenChain,
        S: SignaturePrompt,
    {
        if self.is_busy() {
            return Err(FlowError::Busy);
        }

        self.state = TxState::AwaitingSignature;
        debug!(%summary, "Awaiting wallet signature");

        if !prompt.confirm(&summary).await {
            return Err(self.back_to_editing(ChainError::Rejected));
        }

        match chain.send_transaction(request).await {
            Ok(hash) => {
                info!(%hash, %summary, "Transaction submitted");
                self.state = TxState::AwaitingConfirmation { hash };
                Ok(hash)
            }
            Err(e) => Err(self.back_to_editing(e)),
        }
    }

    fn back_to_editing(&mut self, error: ChainError) -> FlowError {
        warn!(error = %error, "Wallet did not submit the transaction");
        self.notify(Notice::info(error.to_string()));
        self.state = TxState::Editing;
        FlowError::Chain(error)
    }

    /// Fetch the receipt of the pending transaction, if any, and apply it.
    pub(crate) async fn poll<C>(&mut self, chain: &C) -> Result<Option<Outcome>, FlowError>
    where
        C: TokenChain,
    {
        let TxState::AwaitingConfirmation { hash } = self.state else {
            return Err(FlowError::NothingPending);
        };

        let update = match chain.receipt(hash).await {
            Ok(None) => ReceiptUpdate::Pending,
            Ok(Some(receipt)) => ReceiptUpdate::Mined(receipt),
            Err(e) => ReceiptUpdate::Error(e.to_string()),
        };
        Ok(self.apply(update))
    }

    /// Apply a receipt update to the current transaction.
    ///
    /// Returns the terminal outcome the update leads to, or `None` while the
    /// transaction is still pending or when no transaction exists.
    ///
    /// A confirmed or failed transaction keeps its state; later updates
    /// only report the outcome already reached.
    pub(crate) fn apply(&mut self, update: ReceiptUpdate) -> Option<Outcome> {
        let hash = match &self.state {
            TxState::AwaitingConfirmation { hash } => *hash,
            TxState::Confirmed { .. } => return Some(Outcome::Success),
            TxState::Failed { .. } => return Some(Outcome::Failure),
            TxState::Editing | TxState::AwaitingSignature => return None,
        };

        match update {
            ReceiptUpdate::Pending => None,
            ReceiptUpdate::Mined(receipt) if receipt.success => {
                self.state = TxState::Confirmed { hash, receipt };
                if self.guard.first(hash) {
                    info!(%hash, block_number = receipt.block_number, gas_used = receipt.gas_used, "Transaction confirmed");
                    let link = explorer_url(self.chain_id, hash, ExplorerKind::Tx);
                    self.notify(Notice::success(self.messages.success, link));
                }
                Some(Outcome::Success)
            }
            ReceiptUpdate::Mined(receipt) => {
                let reason = self.messages.reverted.to_string();
                self.fail(hash, reason, receipt.block_number);
                Some(Outcome::Failure)
            }
            ReceiptUpdate::Error(reason) => {
                self.fail(hash, reason, None);
                Some(Outcome::Failure)
            }
        }
    }

    fn fail(&mut self, hash: TxHash, reason: String, block_number: Option<u64>) {
        if self.guard.first(hash) {
            warn!(%hash, block_number, reason = %reason, "Transaction failed");
            self.notify(Notice::error(reason.clone()));
        }
        self.state = TxState::Failed { hash, reason };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{mined, RecordingNotifier},
        NoticeLevel,
    };
    use alloy_primitives::B256;

    const MESSAGES: Messages = Messages {
        success: "Done!",
        reverted: "Reverted.",
    };

    fn pending(notifier: &RecordingNotifier, hash: TxHash) -> TxLifecycle<RecordingNotifier> {
        let mut lifecycle = TxLifecycle::new(notifier.clone(), 11155111, MESSAGES);
        lifecycle.state = TxState::AwaitingConfirmation { hash };
        lifecycle
    }

    #[test]
    fn test_updates_without_transaction_are_ignored() {
        let notifier = RecordingNotifier::default();
        let mut lifecycle = TxLifecycle::new(notifier.clone(), 1, MESSAGES);

        assert_eq!(lifecycle.apply(ReceiptUpdate::Mined(mined(true))), None);
        assert_eq!(lifecycle.state(), &TxState::Editing);
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_success_notified_once() {
        let notifier = RecordingNotifier::default();
        let hash = B256::repeat_byte(9);
        let mut lifecycle = pending(&notifier, hash);

        assert_eq!(lifecycle.apply(ReceiptUpdate::Pending), None);
        for _ in 0..5 {
            assert_eq!(
                lifecycle.apply(ReceiptUpdate::Mined(mined(true))),
                Some(Outcome::Success)
            );
        }

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(
            notices[0].link.as_deref(),
            Some(format!("https://sepolia.etherscan.io/tx/{hash}").as_str())
        );
        assert!(!lifecycle.is_busy());
    }

    #[test]
    fn test_revert_notified_once() {
        let notifier = RecordingNotifier::default();
        let hash = B256::repeat_byte(9);
        let mut lifecycle = pending(&notifier, hash);

        lifecycle.apply(ReceiptUpdate::Mined(mined(false)));
        lifecycle.apply(ReceiptUpdate::Mined(mined(false)));
        assert_eq!(
            lifecycle.apply(ReceiptUpdate::Error("timeout".to_string())),
            Some(Outcome::Failure)
        );

        assert_eq!(notifier.count(NoticeLevel::Error), 1);
        assert!(matches!(lifecycle.state(), TxState::Failed { reason, .. } if reason == "Reverted."));
    }

    #[test]
    fn test_confirmed_transaction_stays_confirmed() {
        let notifier = RecordingNotifier::default();
        let hash = B256::repeat_byte(9);
        let mut lifecycle = pending(&notifier, hash);

        assert_eq!(
            lifecycle.apply(ReceiptUpdate::Mined(mined(true))),
            Some(Outcome::Success)
        );
        assert_eq!(
            lifecycle.apply(ReceiptUpdate::Error("receipt wait timed out".to_string())),
            Some(Outcome::Success)
        );
        assert_eq!(
            lifecycle.apply(ReceiptUpdate::Mined(mined(false))),
            Some(Outcome::Success)
        );

        assert_eq!(notifier.notices().len(), 1);
        assert_eq!(notifier.count(NoticeLevel::Error), 0);
        assert!(matches!(lifecycle.state(), TxState::Confirmed { hash: h, .. } if *h == hash));
    }

    #[test]
    fn test_reset_is_ignored_while_busy() {
        let notifier = RecordingNotifier::default();
        let hash = B256::repeat_byte(9);
        let mut lifecycle = pending(&notifier, hash);

        lifecycle.reset();
        assert!(lifecycle.is_busy());

        lifecycle.apply(ReceiptUpdate::Mined(mined(true)));
        lifecycle.reset();
        assert_eq!(lifecycle.state(), &TxState::Editing);
    }
}

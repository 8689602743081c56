use alloy_primitives::TxHash;
use serde::Serialize;
use std::collections::HashSet;

/// Terminal outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    Success,
    Failure,
}

/// Remembers which hashes already had their terminal notice, so a
/// transaction is announced once no matter how many receipt updates follow.
#[derive(Debug, Default)]
pub struct NotificationGuard {
    notified: HashSet<TxHash>,
}

impl NotificationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time `hash` is seen.
    pub fn first(&mut self, hash: TxHash) -> bool {
        self.notified.insert(hash)
    }
}

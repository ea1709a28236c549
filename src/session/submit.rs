//! Submission of transaction groups with confirmation

use std::sync::Arc;

use tracing::debug;

use crate::error::{GameError, GameResult};
use crate::ledger::{Address, Confirmation, LedgerClient, Transaction};

/// Sends transactions on behalf of the local player and waits for them to land
pub(crate) struct Submitter<L> {
    ledger: Arc<L>,
    sender: Address,
    confirmation_rounds: u64,
}

impl<L> Clone for Submitter<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            sender: self.sender,
            confirmation_rounds: self.confirmation_rounds,
        }
    }
}

impl<L: LedgerClient> Submitter<L> {
    pub(crate) fn new(ledger: Arc<L>, sender: Address, confirmation_rounds: u64) -> Self {
        Self {
            ledger,
            sender,
            confirmation_rounds,
        }
    }

    pub(crate) fn sender(&self) -> Address {
        self.sender
    }

    /// Submit one atomic group and wait for its confirmation
    pub(crate) async fn send(&self, group: Vec<Transaction>) -> GameResult<Confirmation> {
        let size = group.len();
        let txid = self
            .ledger
            .submit(group)
            .await
            .map_err(|e| GameError::from(e).context("submit transaction"))?;
        debug!(%txid, size, "Submitted transaction group");

        let confirmation = self
            .ledger
            .await_confirmation(&txid, self.confirmation_rounds)
            .await
            .map_err(|e| GameError::from(e).context("await confirmation"))?;
        debug!(%txid, round = confirmation.round, "Transaction group confirmed");

        Ok(confirmation)
    }
}

//! Turns the ledger's block cadence into a stream of observation points

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::LedgerError;
use crate::ledger::LedgerClient;

/// Unbounded sequence of ledger rounds fed by a background task
///
/// The first value is the round current at spawn time; each later value is
/// the round reached after waiting for the previous one plus one. A ledger
/// error is delivered once and ends the sequence. Dropping the tracker or
/// cancelling its token stops the background task.
#[derive(Debug)]
pub struct RoundTracker {
    rounds: mpsc::Receiver<Result<u64, LedgerError>>,
    task: JoinHandle<()>,
}

impl RoundTracker {
    pub fn spawn<L: LedgerClient>(ledger: Arc<L>, capacity: usize, cancel: CancellationToken) -> Self {
        let (tx, rounds) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => debug!("Round tracking cancelled"),
                _ = track(ledger.as_ref(), &tx) => {}
            }
        });

        Self { rounds, task }
    }

    /// Next round, `None` once the sequence has ended
    pub async fn next(&mut self) -> Option<Result<u64, LedgerError>> {
        self.rounds.recv().await
    }
}

impl Drop for RoundTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn track<L: LedgerClient>(ledger: &L, tx: &mpsc::Sender<Result<u64, LedgerError>>) {
    let mut round = match ledger.current_round().await {
        Ok(round) => round,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return;
        }
    };

    loop {
        trace!(round, "Round reached");
        if tx.send(Ok(round)).await.is_err() {
            return;
        }

        round = match ledger.wait_for_round(round + 1).await {
            Ok(reached) => reached,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };
    }
}

//! Background task that observes the ledger once per round

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use super::events::EventBus;
use super::rounds::RoundTracker;
use super::stage_machine::{RevealPlan, Snapshot, StageMachine};
use super::submit::Submitter;
use crate::commitment::CommitRevealManager;
use crate::error::{GameError, GameResult};
use crate::ledger::{Address, LedgerClient, SessionId, Transaction};
use crate::state::{GlobalState, LocalState};

/// Latest state published by the poller for read-only callers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub global: GlobalState,
    pub local: Option<LocalState>,
    pub opponent: Option<LocalState>,
}

/// Submits the local player's reveals
pub(crate) struct RevealContext<L> {
    submitter: Submitter<L>,
    session: SessionId,
    secrets: Arc<RwLock<CommitRevealManager>>,
}

impl<L> Clone for RevealContext<L> {
    fn clone(&self) -> Self {
        Self {
            submitter: self.submitter.clone(),
            session: self.session,
            secrets: Arc::clone(&self.secrets),
        }
    }
}

impl<L: LedgerClient> RevealContext<L> {
    pub(crate) fn new(submitter: Submitter<L>, session: SessionId, secrets: Arc<RwLock<CommitRevealManager>>) -> Self {
        Self {
            submitter,
            session,
            secrets,
        }
    }

    async fn reveal_cell(&self, index: u64, include_index: bool) -> GameResult<()> {
        let secret = self.secrets.read().await.reveal_secret(index);
        let txn = Transaction::reveal(
            self.submitter.sender(),
            self.session,
            secret,
            include_index.then_some(index),
        );
        self.submitter.send(vec![txn]).await?;
        debug!(index, "Cell revealed");
        Ok(())
    }

    async fn reveal_remaining(&self, indices: Vec<u64>, end_index: u64) -> GameResult<()> {
        let mut tasks = JoinSet::new();
        for index in indices {
            let ctx = self.clone();
            tasks.spawn(async move { ctx.reveal_cell(index, true).await }.in_current_span());
        }

        let mut failed = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Cell reveal failed");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Cell reveal task aborted");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(GameError::RevealIncomplete { failed });
        }

        self.reveal_cell(end_index, true).await?;
        info!("All cells revealed");
        Ok(())
    }

    /// Run a reveal plan without holding up the polling loop
    fn spawn(self, plan: RevealPlan) {
        tokio::spawn(
            async move {
                let result = match plan {
                    RevealPlan::Guessed { index } => self.reveal_cell(index, false).await,
                    RevealPlan::Remaining { indices, end_index } => self.reveal_remaining(indices, end_index).await,
                };
                if let Err(e) = result {
                    error!(error = %e, "Reveal failed");
                }
            }
            .in_current_span(),
        );
    }
}

/// Owns the cached game state for one session
pub(crate) struct Poller<L> {
    ledger: Arc<L>,
    session: SessionId,
    player: Address,
    opponent: Address,
    machine: StageMachine,
    reveals: RevealContext<L>,
    events: EventBus,
    view: watch::Sender<SessionView>,
    round_buffer: usize,
}

impl<L: LedgerClient> Poller<L> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ledger: Arc<L>,
        session: SessionId,
        player: Address,
        opponent: Address,
        machine: StageMachine,
        reveals: RevealContext<L>,
        events: EventBus,
        view: watch::Sender<SessionView>,
        round_buffer: usize,
    ) -> Self {
        Self {
            ledger,
            session,
            player,
            opponent,
            machine,
            reveals,
            events,
            view,
            round_buffer,
        }
    }

    /// Poll until cancelled, the round tracker fails or a protocol violation is seen
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        let mut rounds = RoundTracker::spawn(Arc::clone(&self.ledger), self.round_buffer, cancel.child_token());
        info!(stage = %self.machine.stage(), "Polling started");

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = rounds.next() => next,
            };

            let round = match next {
                Some(Ok(round)) => round,
                Some(Err(e)) => {
                    error!(error = %e, "Round tracking failed");
                    break;
                }
                None => break,
            };

            if let Err(e) = self.poll_round(round).await {
                if e.is_protocol_violation() {
                    error!(round, error = %e, "Protocol violation, polling stopped");
                    break;
                }
                warn!(round, error = %e, "Round aborted");
            }
        }

        info!("Polling stopped");
    }

    async fn poll_round(&mut self, round: u64) -> GameResult<()> {
        let snapshot = self.fetch().await?;
        debug!(round, stage = %snapshot.global.stage, "Polled game state");

        let transition = {
            let secrets = self.reveals.secrets.read().await;
            self.machine.observe(snapshot, &secrets)?
        };

        self.view.send_replace(SessionView {
            global: self.machine.global().clone(),
            local: self.machine.local().cloned(),
            opponent: self.machine.opponent_state().cloned(),
        });

        let Some(transition) = transition else {
            return Ok(());
        };
        info!(round, from = %transition.from, to = %transition.to, "Stage changed");

        if let Some(plan) = transition.reveal {
            self.reveals.clone().spawn(plan);
        }

        for event in transition.events {
            debug!(event = event.name(), "Raising event");
            self.events.emit(event);
        }

        Ok(())
    }

    /// Read global, local and opponent state concurrently and decode them
    async fn fetch(&self) -> GameResult<Snapshot> {
        let ledger = self.ledger.as_ref();
        let (global, local, opponent) = tokio::try_join!(
            async {
                ledger
                    .read_global_state(self.session)
                    .await
                    .map_err(|e| GameError::from(e).context("read global state"))
            },
            async {
                ledger
                    .read_local_state(self.session, self.player)
                    .await
                    .map_err(|e| GameError::from(e).context("read local state"))
            },
            async {
                ledger
                    .read_local_state(self.session, self.opponent)
                    .await
                    .map_err(|e| GameError::from(e).context("read opponent state"))
            },
        )?;

        let global = GlobalState::decode(&global)?;
        let local = LocalState::decode(global.grid, local.as_ref())?;
        let opponent = LocalState::decode(global.grid, opponent.as_ref())?;

        Ok(Snapshot { global, local, opponent })
    }
}

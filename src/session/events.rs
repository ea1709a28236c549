//! Events raised to the presentation layer

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::state::{Cell, PlacementValidity};

/// Something the local player should react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// It is the local player's turn to guess
    GuessNeeded,
    /// The opponent revealed the cell the local player guessed
    GuessResult {
        index: u64,
        revealed: Cell,
        game_over: bool,
    },
    /// The opponent guessed a cell on the local board
    ///
    /// `game_over` is computed before the ledger confirms the hit and is only a
    /// hint; the next local state read carries the authoritative ship count.
    OpponentGuess {
        index: u64,
        was_hit: bool,
        game_over: bool,
    },
    /// The game ended
    Finish {
        did_win: bool,
        local_grid_valid: PlacementValidity,
        opponent_grid_valid: PlacementValidity,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GuessNeeded => "guess_needed",
            GameEvent::GuessResult { .. } => "guess_result",
            GameEvent::OpponentGuess { .. } => "opponent_guess",
            GameEvent::Finish { .. } => "finish",
        }
    }
}

/// Fan-out of game events to every subscriber, in emission order
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<GameEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Deliver an event; subscribers that went away are dropped
    pub fn emit(&self, event: GameEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drop every subscription; receivers observe the end of the stream
    pub fn clear(&self) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

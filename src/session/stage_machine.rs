//! Detects stage transitions between polls and decides how to react

use tracing::warn;

use super::events::GameEvent;
use crate::commitment::CommitRevealManager;
use crate::error::{GameError, GameResult};
use crate::ledger::Address;
use crate::state::{Cell, GlobalState, LocalState, Stage};

/// Everything read from the ledger in one round
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub global: GlobalState,
    pub local: LocalState,
    pub opponent: LocalState,
}

/// Reveal transactions the local player owes the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealPlan {
    /// Answer the opponent's guess on `index`
    Guessed { index: u64 },
    /// Reveal every still-committed cell, then signal completion with `end_index`
    Remaining { indices: Vec<u64>, end_index: u64 },
}

/// Reaction to an observed stage change
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
    pub reveal: Option<RevealPlan>,
    pub events: Vec<GameEvent>,
}

/// Cached view of the game used as the baseline for the next poll
#[derive(Debug, Clone)]
pub struct StageMachine {
    player: Address,
    opponent: Address,
    global: GlobalState,
    local: Option<LocalState>,
    opponent_state: Option<LocalState>,
}

impl StageMachine {
    pub fn new(player: Address, opponent: Address, initial: GlobalState) -> Self {
        Self {
            player,
            opponent,
            global: initial,
            local: None,
            opponent_state: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.global.stage
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn local(&self) -> Option<&LocalState> {
        self.local.as_ref()
    }

    pub fn opponent_state(&self) -> Option<&LocalState> {
        self.opponent_state.as_ref()
    }

    /// Compare a new snapshot against the cached one
    ///
    /// Returns `None` while the stage is unchanged. On error the cached state
    /// is left untouched so the next round diffs against the same baseline.
    pub fn observe(&mut self, snapshot: Snapshot, layout: &CommitRevealManager) -> GameResult<Option<Transition>> {
        let previous = &self.global;
        let current = &snapshot.global;

        if previous.stage == current.stage {
            self.commit(snapshot);
            return Ok(None);
        }

        if !Stage::is_valid_transition(previous.stage, current.stage) {
            warn!(from = %previous.stage, to = %current.stage, "Stage moved backwards");
        }

        let mut events = Vec::new();
        let mut reveal = None;

        if previous.stage == Stage::Reveal && current.player(previous.turn) == Some(self.player) {
            match previous.current_guess {
                Some(index) => events.push(GameEvent::GuessResult {
                    index,
                    revealed: snapshot.opponent.cell(index).unwrap_or(Cell::Unplaced),
                    game_over: current.stage == Stage::PostReveal,
                }),
                None => warn!(to = %current.stage, "Reveal ended without a recorded guess"),
            }
        }

        match current.stage {
            Stage::Guess => {
                if current.turn_holder() == Some(self.player) {
                    events.push(GameEvent::GuessNeeded);
                }
            }
            Stage::Reveal => {
                if current.turn_holder() == Some(self.opponent) {
                    let index = current
                        .current_guess
                        .ok_or_else(|| GameError::decode("guess", "missing in reveal stage"))?;
                    let cells = current.cell_count();
                    if index > cells {
                        return Err(GameError::OutOfRangeGuess { index, cells });
                    }

                    let was_hit = layout.has_ship(index);
                    reveal = Some(RevealPlan::Guessed { index });
                    events.push(GameEvent::OpponentGuess {
                        index,
                        was_hit,
                        game_over: was_hit && snapshot.local.ships_left == 1,
                    });
                }
            }
            Stage::PostReveal => {
                reveal = Some(RevealPlan::Remaining {
                    indices: snapshot.local.unrevealed().collect(),
                    end_index: current.cell_count(),
                });
            }
            Stage::Finished => {
                events.push(GameEvent::Finish {
                    did_win: current.winner_address() == Some(self.player),
                    local_grid_valid: snapshot.local.placement_valid,
                    opponent_grid_valid: snapshot.opponent.placement_valid,
                });
            }
            Stage::WaitingForP2 | Stage::Placement => {}
        }

        let transition = Transition {
            from: previous.stage,
            to: current.stage,
            reveal,
            events,
        };
        self.commit(snapshot);

        Ok(Some(transition))
    }

    fn commit(&mut self, snapshot: Snapshot) {
        self.global = snapshot.global;
        self.local = Some(snapshot.local);
        self.opponent_state = Some(snapshot.opponent);
    }
}

//! Decoding of raw ledger snapshots into typed game state

use std::fmt;

use serde::{Deserialize, Serialize};

use super::grid::{Grid, MAX_GRID_SIZE};
use super::keys;
use crate::commitment::Commitment;
use crate::error::{GameError, GameResult};
use crate::ledger::{decode_uint, encode_uint, Address, StateMap, StateValue};

/// Game stage as stored by the on-chain program
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    WaitingForP2,
    Placement,
    Guess,
    Reveal,
    PostReveal,
    Finished,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::WaitingForP2,
        Stage::Placement,
        Stage::Guess,
        Stage::Reveal,
        Stage::PostReveal,
        Stage::Finished,
    ];

    pub fn from_uint(value: u64) -> Option<Self> {
        usize::try_from(value).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_uint(self) -> u64 {
        self as u64
    }

    /// Whether an observer may see `to` after `from`
    ///
    /// Stages only move forward (several may pass between two polls), except
    /// that `reveal` hands back to `guess` every turn.
    pub fn is_valid_transition(from: Stage, to: Stage) -> bool {
        to >= from || (from == Stage::Reveal && to == Stage::Guess)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::WaitingForP2 => "waiting_for_p2",
            Stage::Placement => "placement",
            Stage::Guess => "guess",
            Stage::Reveal => "reveal",
            Stage::PostReveal => "post_reveal",
            Stage::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// One of the two seats in a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    Player1,
    Player2,
}

impl Turn {
    pub fn other(self) -> Self {
        match self {
            Turn::Player1 => Turn::Player2,
            Turn::Player2 => Turn::Player1,
        }
    }

    /// Global key naming this seat, also the byte value stored under `turn`/`winner`
    pub fn key(self) -> &'static [u8] {
        match self {
            Turn::Player1 => keys::PLAYER1,
            Turn::Player2 => keys::PLAYER2,
        }
    }
}

/// A board cell as the ledger sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Not placed yet
    Unplaced,
    /// Placed; only the commitment is public
    Committed(Commitment),
    /// Revealed; `true` when the cell holds a ship
    Revealed(bool),
}

impl Cell {
    pub fn is_committed(&self) -> bool {
        matches!(self, Cell::Committed(_))
    }
}

/// Result of the program's end-of-game placement check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementValidity {
    Unknown,
    Valid,
    Invalid,
}

/// Shared game state read from the application's global storage
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalState {
    pub player1: Option<Address>,
    pub player2: Option<Address>,
    pub stage: Stage,
    pub turn: Turn,
    pub grid: Grid,
    pub total_ships: u32,
    pub current_guess: Option<u64>,
    pub winner: Option<Turn>,
    pub placed_count: u64,
    pub revealed_count: u64,
}

impl GlobalState {
    pub fn decode(state: &StateMap) -> GameResult<Self> {
        let stage = match uint_field(state, keys::STAGE)? {
            None => Stage::WaitingForP2,
            Some(value) => Stage::from_uint(value)
                .ok_or_else(|| GameError::decode("stage", format!("unknown stage {value}")))?,
        };

        let grid_size = uint_field(state, keys::GRID_SIZE)?
            .ok_or_else(|| GameError::decode("grid size", "missing"))?;
        let grid_size = u32::try_from(grid_size)
            .ok()
            .filter(|size| (1..=MAX_GRID_SIZE).contains(size))
            .ok_or_else(|| GameError::decode("grid size", format!("invalid grid size {grid_size}")))?;
        let grid = Grid::new(grid_size);

        let total_ships = uint_field(state, keys::NUM_SHIPS)?
            .ok_or_else(|| GameError::decode("num ships", "missing"))?;
        let total_ships = u32::try_from(total_ships)
            .ok()
            .filter(|ships| *ships > 0 && u64::from(*ships) <= grid.cells())
            .ok_or_else(|| GameError::decode("num ships", format!("invalid ship count {total_ships}")))?;

        let turn = match bytes_field(state, keys::TURN)? {
            Some(value) if value == keys::PLAYER2 => Turn::Player2,
            _ => Turn::Player1,
        };

        let winner = bytes_field(state, keys::WINNER)?.map(|value| {
            if value == keys::PLAYER1 {
                Turn::Player1
            } else {
                Turn::Player2
            }
        });

        let current_guess = match bytes_field(state, keys::GUESS)? {
            None => None,
            Some(value) => Some(decode_uint(value).ok_or_else(|| GameError::decode("guess", "expected 8 bytes"))?),
        };

        Ok(Self {
            player1: address_field(state, keys::PLAYER1)?,
            player2: address_field(state, keys::PLAYER2)?,
            stage,
            turn,
            grid,
            total_ships,
            current_guess,
            winner,
            placed_count: uint_field(state, keys::NUM_PLACED)?.unwrap_or(0),
            revealed_count: uint_field(state, keys::NUM_REVEALED)?.unwrap_or(0),
        })
    }

    pub fn cell_count(&self) -> u64 {
        self.grid.cells()
    }

    /// Address seated at `turn`
    pub fn player(&self, turn: Turn) -> Option<Address> {
        match turn {
            Turn::Player1 => self.player1,
            Turn::Player2 => self.player2,
        }
    }

    pub fn turn_holder(&self) -> Option<Address> {
        self.player(self.turn)
    }

    pub fn winner_address(&self) -> Option<Address> {
        self.winner.and_then(|turn| self.player(turn))
    }
}

/// Per-player state read from an account's local storage
#[derive(Debug, Clone, PartialEq)]
pub struct LocalState {
    pub joined: bool,
    pub placing: bool,
    pub ships_left: u64,
    pub placement_valid: PlacementValidity,
    pub cells: Vec<Cell>,
}

impl LocalState {
    /// Decode local state for a board of `grid`; `None` means the account has not opted in
    pub fn decode(grid: Grid, state: Option<&StateMap>) -> GameResult<Self> {
        if grid.size() > MAX_GRID_SIZE {
            return Err(GameError::decode(
                "grid size",
                format!("board side {} exceeds {MAX_GRID_SIZE}", grid.size()),
            ));
        }
        let cell_count = usize::try_from(grid.cells())
            .map_err(|_| GameError::decode("grid size", "board does not fit in memory"))?;

        let Some(state) = state else {
            return Ok(Self {
                joined: false,
                placing: false,
                ships_left: 0,
                placement_valid: PlacementValidity::Unknown,
                cells: vec![Cell::Unplaced; cell_count],
            });
        };

        let miss = encode_uint(0);
        let ship = encode_uint(1);
        let mut cells = Vec::with_capacity(cell_count);
        for index in 0..grid.cells() {
            let key = keys::cell_key(index);
            let cell = match state.get(&key) {
                None => Cell::Unplaced,
                Some(StateValue::Bytes(value)) if *value == miss => Cell::Revealed(false),
                Some(StateValue::Bytes(value)) if *value == ship => Cell::Revealed(true),
                Some(StateValue::Bytes(value)) => {
                    let commitment = Commitment::from_slice(value).ok_or_else(|| {
                        GameError::decode(&format!("cell {index}"), format!("unexpected {}-byte value", value.len()))
                    })?;
                    Cell::Committed(commitment)
                }
                Some(StateValue::Uint(value)) => {
                    return Err(GameError::decode(
                        &format!("cell {index}"),
                        format!("unexpected integer value {value}"),
                    ));
                }
            };
            cells.push(cell);
        }

        let placement_valid = match uint_field(state, keys::PLACEMENT)? {
            None => PlacementValidity::Unknown,
            Some(keys::PLACEMENT_VALID) => PlacementValidity::Valid,
            Some(_) => PlacementValidity::Invalid,
        };

        Ok(Self {
            joined: true,
            placing: uint_field(state, keys::PLACING)?.is_some_and(|v| v != 0),
            ships_left: uint_field(state, keys::SHIPS)?.unwrap_or(0),
            placement_valid,
            cells,
        })
    }

    /// Indices of cells placed but not yet revealed
    pub fn unrevealed(&self) -> impl Iterator<Item = u64> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_committed())
            .map(|(index, _)| index as u64)
    }

    pub fn cell(&self, index: u64) -> Option<Cell> {
        usize::try_from(index).ok().and_then(|i| self.cells.get(i).copied())
    }
}

fn uint_field(state: &StateMap, key: &[u8]) -> GameResult<Option<u64>> {
    match state.get(key) {
        None => Ok(None),
        Some(StateValue::Uint(value)) => Ok(Some(*value)),
        Some(StateValue::Bytes(_)) => Err(GameError::decode(&keys::display(key), "expected integer, got bytes")),
    }
}

fn bytes_field<'a>(state: &'a StateMap, key: &[u8]) -> GameResult<Option<&'a [u8]>> {
    match state.get(key) {
        None => Ok(None),
        Some(StateValue::Bytes(value)) => Ok(Some(value.as_slice())),
        Some(StateValue::Uint(_)) => Err(GameError::decode(&keys::display(key), "expected bytes, got integer")),
    }
}

fn address_field(state: &StateMap, key: &[u8]) -> GameResult<Option<Address>> {
    match bytes_field(state, key)? {
        None => Ok(None),
        Some(value) => Address::from_slice(value)
            .map(Some)
            .ok_or_else(|| GameError::decode(&keys::display(key), "expected 32-byte address")),
    }
}

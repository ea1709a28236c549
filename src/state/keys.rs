//! Fixed state key layout of the game application

use crate::ledger::encode_uint;

pub const PLAYER1: &[u8] = b"p1";
pub const PLAYER2: &[u8] = b"p2";
pub const STAGE: &[u8] = b"stage";
pub const TURN: &[u8] = b"turn";
pub const GUESS: &[u8] = b"guess";
pub const WINNER: &[u8] = b"winner";
pub const GRID_SIZE: &[u8] = b"grid size";
pub const NUM_SHIPS: &[u8] = b"num ships";
pub const NUM_PLACED: &[u8] = b"num placed";
pub const NUM_REVEALED: &[u8] = b"num revealed";

pub const PLACING: &[u8] = b"placing";
pub const SHIPS: &[u8] = b"ships";
pub const PLACEMENT: &[u8] = b"placement";

/// `placement` value the program writes when a board validated
pub const PLACEMENT_VALID: u64 = 2;

/// Local key holding the value of cell `index`
pub fn cell_key(index: u64) -> Vec<u8> {
    encode_uint(index)
}

/// Printable form of a key for error messages
pub fn display(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(s) if s.chars().all(|c| c.is_ascii_graphic() || c == ' ') => s.to_string(),
        _ => hex::encode(key),
    }
}

//! Typed view of the game application's ledger state

pub mod codec;
pub mod grid;
pub mod keys;

pub use codec::{Cell, GlobalState, LocalState, PlacementValidity, Stage, Turn};
pub use grid::Grid;

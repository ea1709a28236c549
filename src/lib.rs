//! Broadside - client engine for ledger-backed two-player battleship
//!
//! The authoritative game lives in an on-chain application. This crate:
//! - turns the ledger's round cadence into observation points
//! - detects stage transitions in shared state and raises game events
//! - hides ship placement behind per-cell hash commitments until reveal

pub mod commitment;
pub mod config;
pub mod error;
pub mod ledger;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use error::{GameError, GameResult, LedgerError};

pub use commitment::{compute_commitment, verify_commitment, CommitRevealManager, Commitment, Secret};
pub use config::{BroadsideConfig, GameConfig, LedgerConfig};
pub use ledger::{Address, LedgerClient, ProgramBundle, SessionId, StateMap, StateValue, Transaction};
pub use session::{GameEvent, GameSession, RoundTracker, StageMachine};
pub use state::{Cell, GlobalState, Grid, LocalState, PlacementValidity, Stage, Turn};

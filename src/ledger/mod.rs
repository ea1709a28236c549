//! Ledger collaborator contract consumed by the game engine
//!
//! The engine never talks to a node directly. Everything it needs from the
//! ledger (round cadence, transaction submission and confirmation, state reads)
//! goes through [`LedgerClient`], so the node transport and account signing
//! stay outside this crate.

pub mod programs;
pub mod transaction;
pub mod types;

pub use programs::ProgramBundle;
pub use transaction::{StateSchema, Transaction, TransactionKind};
pub use types::{decode_uint, encode_uint, Address, Confirmation, SessionId, StateMap, StateValue, TransactionId};

use std::future::Future;

use crate::error::LedgerError;

/// Access to the distributed ledger that holds the authoritative game state
///
/// Implementations sign submitted transactions with the key of each
/// transaction's sender.
pub trait LedgerClient: Send + Sync + 'static {
    /// Latest round the ledger has produced
    fn current_round(&self) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Suspend until `round` (or a later one) is reached, returning the round reached
    fn wait_for_round(&self, round: u64) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Submit a group of transactions to be committed atomically
    fn submit(&self, group: Vec<Transaction>) -> impl Future<Output = Result<TransactionId, LedgerError>> + Send;

    /// Wait at most `max_rounds` rounds for a submitted group to be confirmed
    fn await_confirmation(
        &self,
        txid: &TransactionId,
        max_rounds: u64,
    ) -> impl Future<Output = Result<Confirmation, LedgerError>> + Send;

    /// Global key-value state of a game application
    fn read_global_state(&self, session: SessionId) -> impl Future<Output = Result<StateMap, LedgerError>> + Send;

    /// Per-account state, `None` when the account has not opted in
    fn read_local_state(
        &self,
        session: SessionId,
        account: Address,
    ) -> impl Future<Output = Result<Option<StateMap>, LedgerError>> + Send;
}

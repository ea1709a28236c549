//! Unsigned application-call transactions built by the game engine

use serde::{Deserialize, Serialize};

use super::programs::ProgramBundle;
use super::types::{encode_uint, Address, SessionId};

/// Storage an application declares at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    pub global_ints: u32,
    pub global_byte_slices: u32,
    pub local_ints: u32,
    pub local_byte_slices: u32,
}

impl Default for StateSchema {
    fn default() -> Self {
        Self {
            global_ints: 5,
            global_byte_slices: 5,
            local_ints: 2,
            local_byte_slices: 9,
        }
    }
}

/// What an application call does
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionKind {
    /// Create the game application and opt the creator in
    Create {
        approval_program: Vec<u8>,
        clear_program: Vec<u8>,
        schema: StateSchema,
        args: Vec<Vec<u8>>,
    },
    OptIn,
    CloseOut,
    Delete,
    /// Plain call carrying application arguments
    NoOp { args: Vec<Vec<u8>> },
}

/// An unsigned transaction; the ledger client signs it with the sender's key
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub sender: Address,
    /// Target application, `None` only for creation
    pub application: Option<SessionId>,
    pub kind: TransactionKind,
}

impl Transaction {
    /// Create a game against `opponent` with `total_ships` ships each
    pub fn create_game(
        sender: Address,
        programs: &ProgramBundle,
        schema: StateSchema,
        opponent: Address,
        total_ships: u32,
    ) -> Self {
        Self {
            sender,
            application: None,
            kind: TransactionKind::Create {
                approval_program: programs.approval.clone(),
                clear_program: programs.clear.clone(),
                schema,
                args: vec![opponent.as_bytes().to_vec(), encode_uint(u64::from(total_ships))],
            },
        }
    }

    pub fn opt_in(sender: Address, session: SessionId) -> Self {
        Self::call(sender, session, TransactionKind::OptIn)
    }

    pub fn close_out(sender: Address, session: SessionId) -> Self {
        Self::call(sender, session, TransactionKind::CloseOut)
    }

    pub fn delete(sender: Address, session: SessionId) -> Self {
        Self::call(sender, session, TransactionKind::Delete)
    }

    /// Commit one cell during placement
    pub fn place_cell(sender: Address, session: SessionId, commitment: &[u8]) -> Self {
        Self::no_op(sender, session, vec![commitment.to_vec()])
    }

    pub fn guess(sender: Address, session: SessionId, index: u64) -> Self {
        Self::no_op(sender, session, vec![encode_uint(index)])
    }

    /// Reveal a cell's secret; the index is only sent outside the guess/reveal cycle
    pub fn reveal(sender: Address, session: SessionId, secret: Vec<u8>, index: Option<u64>) -> Self {
        let mut args = vec![secret];
        if let Some(index) = index {
            args.push(encode_uint(index));
        }
        Self::no_op(sender, session, args)
    }

    pub fn no_op(sender: Address, session: SessionId, args: Vec<Vec<u8>>) -> Self {
        Self::call(sender, session, TransactionKind::NoOp { args })
    }

    fn call(sender: Address, session: SessionId, kind: TransactionKind) -> Self {
        Self {
            sender,
            application: Some(session),
            kind,
        }
    }

    /// Application arguments carried by this transaction
    pub fn args(&self) -> &[Vec<u8>] {
        match &self.kind {
            TransactionKind::Create { args, .. } | TransactionKind::NoOp { args } => args,
            _ => &[],
        }
    }
}

//! Commit-reveal scheme hiding ship placement until it must be disclosed
//!
//! Every board cell is committed as `SHA-512/256(secret || has_ship)` where the
//! secret is fresh random bytes. The on-chain program stores the commitment at
//! placement time and recomputes it when the secret is later revealed.

use std::fmt;

use rand::RngCore;
use sha2::{Digest, Sha512_256};

use crate::error::{GameError, GameResult};

/// Default length of a per-cell secret in bytes
pub const SECRET_LENGTH: usize = 32;

/// Hash published for a placed cell
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", &hex::encode(self.0)[..12])
    }
}

/// Commitment over `secret || has_ship`
pub fn compute_commitment(secret: &[u8], has_ship: bool) -> Commitment {
    let mut hasher = Sha512_256::new();
    hasher.update(secret);
    hasher.update([u8::from(has_ship)]);
    Commitment(hasher.finalize().into())
}

/// Check a revealed secret and value against a published commitment
pub fn verify_commitment(commitment: &Commitment, secret: &[u8], has_ship: bool) -> bool {
    compute_commitment(secret, has_ship) == *commitment
}

/// Per-cell secret, kept in memory for the life of a session
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn generate(length: usize) -> Self {
        let mut bytes = vec![0u8; length];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Secret {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone)]
struct Placement {
    secret: Secret,
    has_ship: bool,
}

/// Owns the local player's secrets and true ship layout
///
/// Slots are filled strictly in order, one per placement transaction, so slot
/// `i` always corresponds to board cell `i`.
#[derive(Debug, Clone)]
pub struct CommitRevealManager {
    slots: Vec<Option<Placement>>,
    cursor: usize,
    secret_length: usize,
}

impl CommitRevealManager {
    pub fn new(cells: usize) -> Self {
        Self::with_secret_length(cells, SECRET_LENGTH)
    }

    pub fn with_secret_length(cells: usize, secret_length: usize) -> Self {
        Self {
            slots: vec![None; cells],
            cursor: 0,
            secret_length,
        }
    }

    /// Number of board cells this manager covers
    pub fn cells(&self) -> usize {
        self.slots.len()
    }

    /// Number of cells placed so far
    pub fn placed(&self) -> usize {
        self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.slots.len()
    }

    /// Commit the next cell with a freshly generated secret
    pub fn place_ship(&mut self, has_ship: bool) -> GameResult<Commitment> {
        let secret = Secret::generate(self.secret_length);
        self.place_with_secret(secret, has_ship)
    }

    /// Commit the next cell with a caller-supplied secret
    pub fn place_with_secret(&mut self, secret: Secret, has_ship: bool) -> GameResult<Commitment> {
        let slot = self.slots.get_mut(self.cursor).ok_or(GameError::PlacementExhausted {
            cells: self.cursor,
        })?;

        let commitment = compute_commitment(secret.as_bytes(), has_ship);
        *slot = Some(Placement { secret, has_ship });
        self.cursor += 1;

        Ok(commitment)
    }

    /// Secret to reveal for `index`
    ///
    /// Empty for the end-of-reveal index (equal to the board size) and for
    /// cells that were never placed locally.
    pub fn reveal_secret(&self, index: u64) -> Vec<u8> {
        self.placement(index)
            .map(|placement| placement.secret.as_bytes().to_vec())
            .unwrap_or_default()
    }

    /// Whether the local player put a ship on `index`
    pub fn has_ship(&self, index: u64) -> bool {
        self.placement(index).is_some_and(|placement| placement.has_ship)
    }

    /// True layout of the local board, `false` for unplaced cells
    pub fn layout(&self) -> Vec<bool> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().is_some_and(|placement| placement.has_ship))
            .collect()
    }

    fn placement(&self, index: u64) -> Option<&Placement> {
        let index = usize::try_from(index).ok()?;
        self.slots.get(index)?.as_ref()
    }
}

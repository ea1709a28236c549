//! Square board geometry

use serde::{Deserialize, Serialize};

/// Largest board side decoded from ledger state
pub const MAX_GRID_SIZE: u32 = 16;

/// A `size` x `size` board; cell index = `x + y * size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: u32,
}

impl Grid {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of cells on the board
    pub fn cells(&self) -> u64 {
        u64::from(self.size) * u64::from(self.size)
    }

    pub fn contains(&self, index: u64) -> bool {
        index < self.cells()
    }

    /// Cell index of `(x, y)`, `None` when off the board
    pub fn coords_to_index(&self, x: u32, y: u32) -> Option<u64> {
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(u64::from(x) + u64::from(y) * u64::from(self.size))
    }

    /// Coordinates of a cell index, `None` when off the board
    pub fn index_to_coords(&self, index: u64) -> Option<(u32, u32)> {
        if !self.contains(index) {
            return None;
        }
        let size = u64::from(self.size);
        let x = u32::try_from(index % size).ok()?;
        let y = u32::try_from(index / size).ok()?;
        Some((x, y))
    }
}

//! Compiled on-chain programs supplied verbatim at game creation

use std::fs;
use std::path::Path;

use crate::config::GameConfig;
use crate::error::GameError;

/// Approval and clear-state program blobs; their content is never interpreted here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBundle {
    pub approval: Vec<u8>,
    pub clear: Vec<u8>,
}

impl ProgramBundle {
    pub fn new(approval: Vec<u8>, clear: Vec<u8>) -> Self {
        Self { approval, clear }
    }

    /// Load both programs from the paths named in the game configuration
    pub fn load(config: &GameConfig) -> Result<Self, GameError> {
        Ok(Self {
            approval: read_program(&config.approval_program)?,
            clear: read_program(&config.clear_program)?,
        })
    }
}

fn read_program(path: &Path) -> Result<Vec<u8>, GameError> {
    let bytes = fs::read(path).map_err(|e| GameError::Program {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if bytes.is_empty() {
        return Err(GameError::Program {
            path: path.display().to_string(),
            message: "program is empty".to_string(),
        });
    }

    Ok(bytes)
}

//! Configuration management for the broadside game engine

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::commitment::SECRET_LENGTH;
use crate::error::GameError;
use crate::ledger::StateSchema;

/// Largest atomic transaction group the ledger accepts
pub const MAX_GROUP_SIZE: usize = 16;

/// Main configuration for the game engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BroadsideConfig {
    /// Ledger interaction settings
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Game settings
    #[serde(default)]
    pub game: GameConfig,
}

/// Ledger-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Rounds to wait for a transaction confirmation before giving up
    pub confirmation_rounds: u64,
    /// Capacity of the channel between the round tracker and the poller
    pub round_buffer: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            confirmation_rounds: 10,
            round_buffer: 1,
        }
    }
}

/// Game-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Placement transactions per atomic group
    pub group_size: usize,
    /// Length of each per-cell secret in bytes
    pub secret_length: usize,
    /// Largest ship count accepted when starting a game
    pub max_ships: u32,
    /// Compiled approval program
    pub approval_program: PathBuf,
    /// Compiled clear-state program
    pub clear_program: PathBuf,
    /// Storage declared when creating a game
    pub schema: StateSchema,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            group_size: MAX_GROUP_SIZE,
            secret_length: SECRET_LENGTH,
            max_ships: 9,
            approval_program: PathBuf::from("game_approval.teal.tok"),
            clear_program: PathBuf::from("game_close_out.teal.tok"),
            schema: StateSchema::default(),
        }
    }
}

impl BroadsideConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let content = fs::read_to_string(path).map_err(|e| GameError::Configuration {
            message: format!("Failed to read config file: {}", e),
            field: "config_file".to_string(),
        })?;

        let config: BroadsideConfig = toml::from_str(&content).map_err(|e| GameError::Configuration {
            message: format!("Failed to parse config file: {}", e),
            field: "config_format".to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), GameError> {
        let content = toml::to_string_pretty(self).map_err(|e| GameError::Configuration {
            message: format!("Failed to serialize config: {}", e),
            field: "config_serialization".to_string(),
        })?;

        fs::write(path, content).map_err(|e| GameError::Configuration {
            message: format!("Failed to write config file: {}", e),
            field: "config_write".to_string(),
        })?;

        Ok(())
    }

    /// Override settings from `BROADSIDE_*` environment variables
    pub fn apply_env(mut self) -> Result<Self, GameError> {
        if let Ok(path) = env::var("BROADSIDE_APPROVAL_PROGRAM") {
            self.game.approval_program = PathBuf::from(path);
        }

        if let Ok(path) = env::var("BROADSIDE_CLEAR_PROGRAM") {
            self.game.clear_program = PathBuf::from(path);
        }

        if let Ok(rounds) = env::var("BROADSIDE_CONFIRMATION_ROUNDS") {
            self.ledger.confirmation_rounds = rounds.parse().map_err(|_| GameError::Configuration {
                message: format!("Invalid confirmation rounds: {}", rounds),
                field: "ledger.confirmation_rounds".to_string(),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), GameError> {
        if self.ledger.confirmation_rounds == 0 {
            return Err(GameError::Configuration {
                message: "Confirmation rounds must be greater than 0".to_string(),
                field: "ledger.confirmation_rounds".to_string(),
            });
        }

        if self.ledger.round_buffer == 0 {
            return Err(GameError::Configuration {
                message: "Round buffer must be greater than 0".to_string(),
                field: "ledger.round_buffer".to_string(),
            });
        }

        if self.game.group_size == 0 || self.game.group_size > MAX_GROUP_SIZE {
            return Err(GameError::Configuration {
                message: format!("Group size must be between 1 and {}", MAX_GROUP_SIZE),
                field: "game.group_size".to_string(),
            });
        }

        if self.game.secret_length < 16 {
            return Err(GameError::Configuration {
                message: "Secrets must be at least 16 bytes".to_string(),
                field: "game.secret_length".to_string(),
            });
        }

        if self.game.max_ships == 0 {
            return Err(GameError::Configuration {
                message: "Max ships must be greater than 0".to_string(),
                field: "game.max_ships".to_string(),
            });
        }

        Ok(())
    }

    /// Configuration for a local development node: quick confirmations, small groups
    pub fn development() -> Self {
        Self {
            ledger: LedgerConfig {
                confirmation_rounds: 4,
                round_buffer: 4,
            },
            game: GameConfig {
                group_size: 4,
                ..GameConfig::default()
            },
        }
    }
}

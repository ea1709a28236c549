//! Error types for the broadside game engine

use thiserror::Error;

use crate::ledger::SessionId;
use crate::state::Stage;

/// Main error type for the broadside game engine
#[derive(Debug, Clone, Error)]
pub enum GameError {
    #[error("Invalid stage for {action}: game is in {stage}")]
    InvalidStage {
        action: &'static str,
        stage: Stage,
    },

    #[error("Wrong ship count: expected {expected}, got {actual}")]
    WrongShipCount {
        expected: u32,
        actual: usize,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("Could not read opponent from global state")]
    OpponentUnresolved,

    #[error("Opponent's guess {index} is outside the board of {cells} cells")]
    OutOfRangeGuess {
        index: u64,
        cells: u64,
    },

    #[error("Transaction pool error: {message}")]
    TransactionPool { message: String },

    #[error("Malformed state for key {key:?}: {message}")]
    StateDecode {
        key: String,
        message: String,
    },

    #[error("Ledger error: {source}")]
    Ledger {
        source: LedgerError,
        context: String,
    },

    #[error("Cell {index} is outside the board of {cells} cells")]
    CellOutOfRange {
        index: u64,
        cells: u64,
    },

    #[error("No active game session")]
    NoActiveSession,

    #[error("Session {0} is still active; reset it first")]
    SessionActive(SessionId),

    #[error("{failed} cell reveals failed; end of reveal not sent")]
    RevealIncomplete { failed: usize },

    #[error("All {cells} placement slots are already filled")]
    PlacementExhausted { cells: usize },

    #[error("Placement already started with a different fleet")]
    PlacementConflict,

    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: String,
    },

    #[error("Failed to load program {path}: {message}")]
    Program {
        path: String,
        message: String,
    },
}

/// Failures reported by the ledger collaborator
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Ledger unavailable: {message}")]
    Unavailable { message: String },

    #[error("Transaction rejected by pool: {message}")]
    TransactionPool { message: String },

    #[error("Transaction not confirmed after {rounds} rounds")]
    ConfirmationTimeout { rounds: u64 },

    #[error("Not found: {what}")]
    NotFound { what: String },
}

impl From<LedgerError> for GameError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::TransactionPool { message } => GameError::TransactionPool { message },
            source => GameError::Ledger {
                source,
                context: String::new(),
            },
        }
    }
}

impl GameError {
    /// Attach context to a ledger failure; other variants pass through unchanged
    pub fn context(self, context: &str) -> Self {
        match self {
            GameError::Ledger { source, .. } => GameError::Ledger {
                source,
                context: context.to_string(),
            },
            other => other,
        }
    }

    pub(crate) fn decode(key: &str, message: impl Into<String>) -> Self {
        GameError::StateDecode {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Whether the polling task must stop after seeing this error
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, GameError::OutOfRangeGuess { .. })
    }
}

/// Type alias for the main result type used throughout the library
pub type GameResult<T> = Result<T, GameError>;

/// Logging configuration and initialization
pub mod logging {
    use std::env;
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    /// Logging output format
    #[derive(Debug, Clone, PartialEq)]
    pub enum LogFormat {
        Human,
        Json,
    }

    /// Logging output destination
    #[derive(Debug, Clone, PartialEq)]
    pub enum LogOutput {
        Stdout,
        Stderr,
    }

    /// Logging configuration
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        pub level: Level,
        pub format: LogFormat,
        pub output: LogOutput,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                format: LogFormat::Human,
                output: LogOutput::Stderr,
            }
        }
    }

    /// Initialize structured logging with the given configuration
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let env_filter = EnvFilter::builder()
            .with_default_directive(config.level.into())
            .from_env_lossy()
            .add_directive("tokio=info".parse()?);

        let registry = tracing_subscriber::registry().with(env_filter);

        match config.format {
            LogFormat::Human => {
                let fmt_layer = fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true);

                match config.output {
                    LogOutput::Stdout => registry.with(fmt_layer.with_writer(std::io::stdout)).try_init()?,
                    LogOutput::Stderr => registry.with(fmt_layer.with_writer(std::io::stderr)).try_init()?,
                }
            }
            LogFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_span_events(fmt::format::FmtSpan::CLOSE);

                match config.output {
                    LogOutput::Stdout => registry.with(fmt_layer.with_writer(std::io::stdout)).try_init()?,
                    LogOutput::Stderr => registry.with(fmt_layer.with_writer(std::io::stderr)).try_init()?,
                }
            }
        }

        Ok(())
    }

    /// Read logging configuration from `BROADSIDE_LOG_*` variables
    pub fn config_from_env() -> LoggingConfig {
        let level = env::var("BROADSIDE_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse::<Level>().ok())
            .unwrap_or(Level::INFO);

        let format = match env::var("BROADSIDE_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };

        let output = match env::var("BROADSIDE_LOG_OUTPUT").as_deref() {
            Ok("stdout") => LogOutput::Stdout,
            _ => LogOutput::Stderr,
        };

        LoggingConfig { level, format, output }
    }

    /// Initialize logging with environment-based configuration
    pub fn init_from_env() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        init_logging(config_from_env())
    }
}

// Errors surfaced to the caller of a rejected command.
//
// Every variant is local and recoverable: a command that fails leaves the
// session exactly as it was and emits no change notification. The relay sends
// the error back to the originating client only. Serializable so it can ride
// inside `ServerMessage::CommandFailed` unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection reasons for area commands and session operations.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    /// The area has no session for a command that needs one.
    #[error("Game not in progress")]
    GameNotInProgress,

    /// The command names a different session than the live one.
    #[error("Game ID mismatch")]
    GameIdMismatch,

    /// A state-machine precondition does not hold.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A move from the wrong slot, the wrong player, or outside a round.
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// The command kind is not one the area understands.
    #[error("Invalid command")]
    InvalidCommand,
}

/// Failure to load a `GameConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classification of a `GameError`, used to decide how much detail
/// reaches the client: validation and conflict errors surface their
/// message verbatim, internal errors surface a generic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    StateConflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("room {code} not found")]
    RoomNotFound { code: String },

    #[error("round {id} not found")]
    RoundNotFound { id: String },

    #[error("player not found in room")]
    PlayerNotFound,

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("player name '{name}' is already taken")]
    NameTaken { name: String },

    #[error("room {code} is full")]
    RoomFull { code: String },

    #[error("room code {code} already exists")]
    RoomCodeCollision { code: String },

    #[error("invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("{action} is not allowed while the room is {phase}")]
    WrongPhase { action: String, phase: String },

    #[error("only the host can {action}")]
    NotHost { action: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        GameError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        GameError::Internal(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::RoomNotFound { .. }
            | GameError::RoundNotFound { .. }
            | GameError::PlayerNotFound => ErrorKind::NotFound,
            GameError::Validation { .. } | GameError::InvalidSubmission { .. } => {
                ErrorKind::Validation
            }
            GameError::NameTaken { .. }
            | GameError::RoomFull { .. }
            | GameError::RoomCodeCollision { .. } => ErrorKind::Conflict,
            GameError::WrongPhase { .. } | GameError::NotHost { .. } => ErrorKind::StateConflict,
            GameError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to send to a client. Internal detail stays in the
    /// server logs.
    pub fn client_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Something went wrong, please try again".to_string(),
            _ => self.to_string(),
        }
    }
}

//! Error types.

use crate::{Id, SessionPhase};

/// Which input field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Text,
}

/// User input failed a precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("username cannot be empty")]
    EmptyUsername,
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("message text cannot be empty")]
    EmptyText,
}

impl ValidationError {
    /// The field the failure belongs to.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::EmptyUsername | ValidationError::UsernameTooShort { .. } => {
                Field::Username
            }
            ValidationError::EmptyText => Field::Text,
        }
    }
}

/// A frame reached dispatch that is not a valid envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A user with this id is already in the roster.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user {id} is already in the roster")]
pub struct DuplicateUserError {
    pub id: Id,
}

/// Anything a session operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    DuplicateUser(#[from] DuplicateUserError),
    #[error("transport did not deliver join for {0}")]
    JoinNotDelivered(Id),
    #[error("already joined")]
    AlreadyJoined,
    #[error("cannot send while {0:?}")]
    NotJoined(SessionPhase),
}

use thiserror::Error;

use crate::{dao::storage::StorageError, state::sequence::ButtonIdError};

/// Errors that can occur in service layer operations.
///
/// None of these end a game; callers report them and carry on.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Score storage cannot be written.
    #[error("score storage failed: {0}")]
    Unavailable(#[source] StorageError),
    /// Invalid input provided by the player.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested score entry was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ButtonIdError> for ServiceError {
    fn from(err: ButtonIdError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

//! Error types for the card store
//!
//! - `ValidationError`: bad form input, reported to the user, state untouched
//! - `PersistError`: the slot could not be written or read
//! - `CardError`: what store operations return

use crate::card::{CardId, Field};
use crate::consts::{MAX_CALORIES, MIN_CALORIES};

/// Rejected user input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required form field was left empty
    #[error("missing required field: {0}")]
    MissingField(Field),

    #[error("initial calories below the {min} kcal minimum")]
    CaloriesTooLow { min: i64 },

    #[error("initial calories above the {max} kcal maximum")]
    CaloriesTooHigh { max: i64 },

    /// Subtract amount missing or not positive
    #[error("invalid amount")]
    InvalidAmount,

    /// Subtract amount larger than what is left
    #[error("cannot subtract more than the {remaining} kcal remaining")]
    ExceedsRemaining { remaining: i64 },
}

impl ValidationError {
    /// Range check for an initial calorie budget
    pub fn check_budget(calories: i64) -> Result<(), ValidationError> {
        if calories < MIN_CALORIES {
            return Err(ValidationError::CaloriesTooLow { min: MIN_CALORIES });
        }
        if calories > MAX_CALORIES {
            return Err(ValidationError::CaloriesTooHigh { max: MAX_CALORIES });
        }
        Ok(())
    }
}

/// Snapshot slot failures
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Storage is full (browser `QuotaExceededError`)
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Error returned by `CardStore` operations
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// In-memory state was updated but could not be made durable
    #[error(transparent)]
    Persistence(#[from] PersistError),

    /// No card with this id
    #[error("card {0} not found")]
    NotFound(CardId),

    /// Subtract called with no detail view open
    #[error("no card is open")]
    NoOpenCard,
}

impl CardError {
    /// Errors that are swallowed instead of shown to the user
    pub fn is_silent(&self) -> bool {
        matches!(self, CardError::NotFound(_) | CardError::NoOpenCard)
    }
}

pub type Result<T, E = CardError> = std::result::Result<T, E>;

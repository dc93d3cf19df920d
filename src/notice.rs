//! Transient success/error notifications

use crate::error::{CardError, PersistError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

/// A message toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn created() -> Self {
        Self::success("Card created successfully!")
    }

    pub fn deleted() -> Self {
        Self::success("Card deleted successfully")
    }

    pub fn subtracted(amount: i64) -> Self {
        Self::success(format!("{} calories subtracted", amount))
    }

    pub fn saved() -> Self {
        Self::success("Changes saved successfully")
    }

    /// Message for a failed operation; `None` for errors that stay silent
    pub fn from_error(err: &CardError) -> Option<Self> {
        if err.is_silent() {
            return None;
        }
        let message = match err {
            CardError::Validation(v) => match v {
                ValidationError::MissingField(_) => "Please fill in all fields".to_string(),
                ValidationError::CaloriesTooLow { min } => {
                    format!("WARNING: Minimum {} daily calories recommended", min)
                }
                ValidationError::CaloriesTooHigh { max } => {
                    format!("WARNING: Maximum {} daily calories recommended", max)
                }
                ValidationError::InvalidAmount => "Enter a valid amount".to_string(),
                ValidationError::ExceedsRemaining { .. } => {
                    "You cannot subtract more calories than are available".to_string()
                }
            },
            CardError::Persistence(PersistError::QuotaExceeded) => {
                "Warning! Storage is full. Delete some cards.".to_string()
            }
            CardError::Persistence(e) => format!("Changes could not be saved: {}", e),
            CardError::NotFound(_) | CardError::NoOpenCard => return None,
        };
        Some(Self::error(message))
    }

    /// CSS class list for the toast element
    pub fn class_name(&self) -> String {
        format!("notification {}", self.kind.as_str())
    }
}

//! Error types for bay lifecycle transitions.

use crate::domain::bay::{BayId, BayStatus};

use super::action::ActionKind;

/// Errors produced by the lot status model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LotStatusError {
    #[error("invalid transition: {action} is not legal for bay {bay_id} in status {status}")]
    InvalidTransition {
        bay_id: BayId,
        status: BayStatus,
        action: ActionKind,
    },

    #[error("registration must not be empty")]
    EmptyRegistration,

    #[error("{field} must not be empty")]
    MissingValue { field: &'static str },

    #[error("bay not found: {0}")]
    BayNotFound(BayId),
}

/// Result type for lot status operations.
pub type LotResult<T> = std::result::Result<T, LotStatusError>;

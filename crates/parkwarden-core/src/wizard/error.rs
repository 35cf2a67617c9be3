//! Error types for guided wizard flows.

use std::fmt;

use super::definition::FieldKey;
use super::engine::WizardPhase;

/// Required fields missing, or values the field does not accept, on a
/// step. Surfaced inline; the wizard stays put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub step: usize,
    pub missing_fields: Vec<FieldKey>,
    pub invalid_fields: Vec<FieldKey>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |keys: &[FieldKey]| {
            keys.iter()
                .map(FieldKey::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "step {}", self.step)?;
        if !self.missing_fields.is_empty() {
            write!(f, " is missing: {}", join(&self.missing_fields))?;
        }
        if !self.invalid_fields.is_empty() {
            if !self.missing_fields.is_empty() {
                f.write_str(";")?;
            }
            write!(f, " has invalid: {}", join(&self.invalid_fields))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The enforcement record store rejected a submission.
///
/// Recoverable: the wizard keeps its fields and captures for a retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitFailure {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid submission: {0}")]
    Invalid(String),
}

/// Errors produced by the wizard engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("already at the first step")]
    AtFirstStep,

    #[error("step {total} is the last step; use submit")]
    AtLastStep { total: usize },

    #[error("submit is only available on the last step (at {step} of {total})")]
    NotAtLastStep { step: usize, total: usize },

    #[error("a submission is already in flight")]
    SubmitInFlight,

    #[error("wizard is not editing (phase: {phase})")]
    NotEditing { phase: WizardPhase },

    #[error("no submission in flight (phase: {phase})")]
    NotSubmitting { phase: WizardPhase },

    #[error("field {0} is not part of this wizard")]
    UnknownField(FieldKey),

    #[error("this wizard has no field for scanned values")]
    NoScanTarget,

    #[error("invalid wizard definition: {0}")]
    InvalidDefinition(String),

    #[error("submit failed: {0}")]
    SubmitFailed(#[from] SubmitFailure),
}

/// Result type for wizard operations.
pub type WizardResult<T> = std::result::Result<T, WizardError>;

//! Guided multi-step flows.
//!
//! - **Definitions**: steps, required fields, submit mode and capture
//!   cardinality for one flow.
//! - **Engine**: drives a definition through editing, submitting and a
//!   timed confirmation; owns its capture slots and timer.
//! - **Flows**: the new-session, change-session and issue-ticket
//!   definitions and the records their submissions produce.

pub mod capture;
pub mod definition;
pub mod engine;
pub mod error;
pub mod flows;
pub mod timer;

pub use capture::{CaptureCategory, CaptureSlot, CaptureSlotStore, PhotoHandle, SlotId};
pub use definition::{
    CapturePolicy, FieldKey, StepDefinition, SubmitMode, WizardDefinition, WizardKind,
};
pub use engine::{NextOutcome, Submission, SubmitHandler, WizardEngine, WizardPhase};
pub use error::{SubmitFailure, ValidationError, WizardError, WizardResult};
pub use flows::{build_record, confirmation_message, definition_for, prefill_for};
pub use timer::{ScheduledTask, TimerToken};

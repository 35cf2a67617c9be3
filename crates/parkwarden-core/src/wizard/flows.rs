//! The three enforcement flows built on the generic engine.
//!
//! - **New session**: plate, optional photos, review.
//! - **Change session**: one prefilled page, submits on Next.
//! - **Issue ticket**: plate, location, violation, evidence.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::bay::{normalize_registration, BaySnapshot};
use crate::domain::ticket::{EnforcementRecord, SessionChange, Ticket, TicketDraft, ViolationKind};

use super::definition::{
    CapturePolicy, FieldKey, StepDefinition, SubmitMode, WizardDefinition, WizardKind,
};
use super::engine::Submission;
use super::error::SubmitFailure;

pub fn new_session_wizard() -> WizardDefinition {
    WizardDefinition::new(
        WizardKind::NewSession,
        SubmitMode::ExplicitReview,
        CapturePolicy::Unbounded,
    )
    .step(StepDefinition::new("License plate").required(FieldKey::Registration))
    .step(StepDefinition::new("Photos").optional(FieldKey::Photos))
    .step(StepDefinition::new("Review"))
    .scan_into(FieldKey::Registration)
}

pub fn change_session_wizard() -> WizardDefinition {
    WizardDefinition::new(
        WizardKind::EditSession,
        SubmitMode::OnNext,
        CapturePolicy::Unbounded,
    )
    .step(
        StepDefinition::new("Session details")
            .required(FieldKey::Registration)
            .required(FieldKey::BayNumber)
            .required(FieldKey::Zone),
    )
    .scan_into(FieldKey::Registration)
}

pub fn issue_ticket_wizard() -> WizardDefinition {
    WizardDefinition::new(
        WizardKind::IssueTicket,
        SubmitMode::ExplicitReview,
        CapturePolicy::OnePerCategory,
    )
    .step(StepDefinition::new("Vehicle").required(FieldKey::Registration))
    .step(
        StepDefinition::new("Location")
            .required(FieldKey::BayNumber)
            .required(FieldKey::Zone),
    )
    .step(
        StepDefinition::new("Violation")
            .required(FieldKey::ViolationKind)
            .optional(FieldKey::Notes),
    )
    .step(StepDefinition::new("Evidence").required(FieldKey::Photos))
    .scan_into(FieldKey::Registration)
}

pub fn definition_for(kind: WizardKind) -> WizardDefinition {
    match kind {
        WizardKind::NewSession => new_session_wizard(),
        WizardKind::EditSession => change_session_wizard(),
        WizardKind::IssueTicket => issue_ticket_wizard(),
    }
}

/// Initial field values taken from the bay the wizard was opened on.
pub fn prefill_for(kind: WizardKind, bay: &BaySnapshot) -> BTreeMap<FieldKey, String> {
    let mut fields = BTreeMap::new();
    if kind == WizardKind::NewSession {
        return fields;
    }
    if let Some(plate) = &bay.registration {
        fields.insert(FieldKey::Registration, plate.clone());
    }
    fields.insert(FieldKey::BayNumber, bay.bay_number.clone());
    fields.insert(FieldKey::Zone, bay.zone_id.clone());
    fields
}

/// Turn a submission into the record it describes.
pub fn build_record(
    submission: &Submission,
    bay: &BaySnapshot,
    now: DateTime<Utc>,
) -> Result<EnforcementRecord, SubmitFailure> {
    let registration = submission
        .field(FieldKey::Registration)
        .and_then(normalize_registration)
        .ok_or_else(|| SubmitFailure::Invalid("registration is blank".into()))?;

    let record = match submission.kind {
        WizardKind::NewSession => EnforcementRecord::Session(SessionChange::Created {
            bay_id: bay.bay_id.clone(),
            registration,
            photos: submission.captures.clone(),
        }),
        WizardKind::EditSession => EnforcementRecord::Session(SessionChange::Edited {
            bay_id: bay.bay_id.clone(),
            registration,
            bay_number: require(submission, FieldKey::BayNumber)?,
            zone_id: require(submission, FieldKey::Zone)?,
        }),
        WizardKind::IssueTicket => {
            let kind_text = require(submission, FieldKey::ViolationKind)?;
            let violation_kind: ViolationKind =
                kind_text.parse().map_err(SubmitFailure::Invalid)?;
            if submission.captures.is_empty() {
                return Err(SubmitFailure::Invalid("a ticket needs at least one photo".into()));
            }
            let draft = TicketDraft {
                bay_id: bay.bay_id.clone(),
                registration,
                bay_number: require(submission, FieldKey::BayNumber)?,
                zone_id: require(submission, FieldKey::Zone)?,
                violation_kind,
                notes: submission.field(FieldKey::Notes).map(str::to_string),
                photos: submission.captures.clone(),
            };
            EnforcementRecord::Ticket(Ticket::issue(draft, now))
        }
    };
    Ok(record)
}

/// Text shown on the confirmation overlay.
pub fn confirmation_message(record: &EnforcementRecord) -> String {
    match record {
        EnforcementRecord::Session(SessionChange::Created { registration, .. }) => {
            format!("Session for {registration} created")
        }
        EnforcementRecord::Session(SessionChange::Edited { registration, .. }) => {
            format!("Session for {registration} updated")
        }
        EnforcementRecord::Ticket(ticket) => format!(
            "Ticket {} issued to {}",
            ticket.ticket_id(),
            ticket.registration()
        ),
    }
}

fn require(submission: &Submission, key: FieldKey) -> Result<String, SubmitFailure> {
    submission
        .field(key)
        .map(str::to_string)
        .ok_or_else(|| SubmitFailure::Invalid(format!("{key} is missing")))
}

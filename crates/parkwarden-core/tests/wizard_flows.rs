use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use parkwarden_core::domain::bay::{Bay, BaySnapshot, BayState};
use parkwarden_core::wizard::flows::{
    change_session_wizard, issue_ticket_wizard, new_session_wizard,
};
use parkwarden_core::{
    build_record, prefill_for, CaptureCategory, EnforcementRecord, FieldKey, NextOutcome,
    PhotoHandle, SessionChange, Submission, SubmitFailure, SubmitHandler, ViolationKind,
    WizardEngine, WizardError, WizardKind, WizardPhase,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
}

fn confirmation() -> Duration {
    Duration::milliseconds(2500)
}

fn warned_bay() -> BaySnapshot {
    Bay::new(
        "b-042",
        "B-042",
        "zone-b",
        BayState::NewSession {
            registration: "ABC-123".into(),
            has_warning: true,
            remaining: None,
        },
    )
    .snapshot()
}

/// Handler that builds the record straight from the submission.
struct RecordBuilder {
    bay: BaySnapshot,
}

#[async_trait]
impl SubmitHandler for RecordBuilder {
    async fn on_submit(&self, submission: &Submission) -> Result<EnforcementRecord, SubmitFailure> {
        build_record(submission, &self.bay, t0())
    }
}

struct Unreachable;

#[async_trait]
impl SubmitHandler for Unreachable {
    async fn on_submit(&self, _: &Submission) -> Result<EnforcementRecord, SubmitFailure> {
        Err(SubmitFailure::Unavailable("backend offline".into()))
    }
}

fn advance_to_last(engine: &mut WizardEngine) {
    while !engine.is_last_step() {
        engine.next().expect("advance");
    }
}

// ---------------------------------------------------------------------------
// Ticket flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ticket_for_warned_session_confirms_then_auto_closes() {
    let bay = warned_bay();
    let mut engine = WizardEngine::new(issue_ticket_wizard(), confirmation())
        .expect("definition")
        .with_prefill(prefill_for(WizardKind::IssueTicket, &bay));

    engine.set_field(FieldKey::Registration, "ABC123").expect("plate");
    engine.next().expect("to location");
    assert_eq!(engine.field(FieldKey::BayNumber), Some("B-042"));
    engine.next().expect("to violation");
    engine
        .set_field(FieldKey::ViolationKind, "overstay")
        .expect("kind");
    engine.next().expect("to evidence");
    engine
        .capture_photo(Some(CaptureCategory::License), PhotoHandle::new("photo://1"))
        .expect("photo");

    let handler = RecordBuilder { bay: bay.clone() };
    let record = engine.submit(&handler, t0()).await.expect("submit").clone();
    let EnforcementRecord::Ticket(ticket) = &record else {
        panic!("expected a ticket, got {record:?}");
    };
    assert_eq!(ticket.registration(), "ABC123");
    assert_eq!(ticket.bay_number(), "B-042");
    assert_eq!(ticket.violation_kind(), ViolationKind::Overstay);
    assert_eq!(ticket.photos().len(), 1);
    assert!(ticket.verify_integrity());

    assert_eq!(engine.phase(), WizardPhase::Confirming);
    assert!(!engine.tick(t0() + Duration::milliseconds(2499)));
    assert_eq!(engine.phase(), WizardPhase::Confirming);
    assert!(engine.tick(t0() + Duration::milliseconds(2500)));
    assert!(engine.is_closed());
    assert!(engine.fields().is_empty());
    assert!(engine.captures().is_empty());
}

#[test]
fn one_photo_per_category_replaces_earlier_shot() {
    let mut engine = WizardEngine::new(issue_ticket_wizard(), confirmation()).expect("definition");
    engine
        .capture_photo(Some(CaptureCategory::License), PhotoHandle::new("first"))
        .expect("first");
    engine
        .capture_photo(Some(CaptureCategory::Vehicle), PhotoHandle::new("car"))
        .expect("car");
    engine
        .capture_photo(Some(CaptureCategory::License), PhotoHandle::new("second"))
        .expect("second");

    let handles: Vec<&str> = engine
        .captures()
        .iter()
        .map(|slot| slot.handle.as_str())
        .collect();
    assert_eq!(handles.len(), 2);
    assert!(handles.contains(&"second"));
    assert!(!handles.contains(&"first"));
}

// ---------------------------------------------------------------------------
// Validation & navigation
// ---------------------------------------------------------------------------

#[test]
fn next_names_missing_required_fields() {
    let mut engine = WizardEngine::new(issue_ticket_wizard(), confirmation()).expect("definition");
    engine.set_field(FieldKey::Registration, "ABC-123").expect("plate");
    engine.next().expect("to location");

    let err = engine.next().expect_err("location is empty");
    let WizardError::Validation(validation) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(validation.step, 2);
    assert_eq!(
        validation.missing_fields,
        vec![FieldKey::BayNumber, FieldKey::Zone]
    );
    assert_eq!(engine.current_step(), 2);
}

#[test]
fn unknown_violation_kind_holds_the_violation_step() {
    let bay = warned_bay();
    let mut engine = WizardEngine::new(issue_ticket_wizard(), confirmation())
        .expect("definition")
        .with_prefill(prefill_for(WizardKind::IssueTicket, &bay));
    engine.next().expect("to location");
    engine.next().expect("to violation");
    engine
        .set_field(FieldKey::ViolationKind, "jaywalking")
        .expect("kind");

    let err = engine.next().expect_err("unknown kind");
    let WizardError::Validation(validation) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(validation.step, 3);
    assert!(validation.missing_fields.is_empty());
    assert_eq!(validation.invalid_fields, vec![FieldKey::ViolationKind]);
    assert_eq!(engine.current_step(), 3);
    assert_eq!(engine.phase(), WizardPhase::Editing);

    engine
        .set_field(FieldKey::ViolationKind, "no payment")
        .expect("kind");
    assert_eq!(
        engine.next().expect("to evidence"),
        NextOutcome::Advanced { step: 4 }
    );
}

#[test]
fn back_then_next_keeps_values() {
    let mut engine = WizardEngine::new(new_session_wizard(), confirmation()).expect("definition");
    engine.set_field(FieldKey::Registration, "XYZ-111").expect("plate");
    engine.next().expect("to photos");
    assert_eq!(engine.back().expect("back"), 1);
    assert_eq!(engine.field(FieldKey::Registration), Some("XYZ-111"));
    assert_eq!(
        engine.next().expect("again"),
        NextOutcome::Advanced { step: 2 }
    );
    assert!(matches!(engine.back(), Ok(1)));
    assert!(matches!(engine.back(), Err(WizardError::AtFirstStep)));
}

#[test]
fn review_step_does_not_submit_on_next() {
    let mut engine = WizardEngine::new(new_session_wizard(), confirmation()).expect("definition");
    engine.set_field(FieldKey::Registration, "XYZ-111").expect("plate");
    advance_to_last(&mut engine);
    assert!(matches!(
        engine.next(),
        Err(WizardError::AtLastStep { total: 3 })
    ));
    assert_eq!(engine.phase(), WizardPhase::Editing);
}

#[test]
fn change_session_submits_on_next() {
    let bay = warned_bay();
    let mut engine = WizardEngine::new(change_session_wizard(), confirmation())
        .expect("definition")
        .with_prefill(prefill_for(WizardKind::EditSession, &bay));
    engine.set_field(FieldKey::Registration, "ABC-124").expect("plate");

    let NextOutcome::Submit(submission) = engine.next().expect("submit") else {
        panic!("single-page wizard should submit");
    };
    assert_eq!(engine.phase(), WizardPhase::Submitting);
    assert_eq!(submission.field(FieldKey::Zone), Some("zone-b"));

    let record = build_record(&submission, &bay, t0());
    let record = engine.complete_submit(record, t0()).expect("complete");
    assert!(matches!(
        record,
        EnforcementRecord::Session(SessionChange::Edited { registration, .. })
            if registration == "ABC-124"
    ));
}

// ---------------------------------------------------------------------------
// Submit lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_submit_keeps_entered_data() {
    let mut engine = WizardEngine::new(new_session_wizard(), confirmation()).expect("definition");
    engine.set_field(FieldKey::Registration, "XYZ-111").expect("plate");
    engine
        .capture_photo(None, PhotoHandle::new("photo://a"))
        .expect("photo");
    advance_to_last(&mut engine);

    let err = engine.submit(&Unreachable, t0()).await.expect_err("offline");
    assert!(matches!(
        err,
        WizardError::SubmitFailed(SubmitFailure::Unavailable(_))
    ));
    assert_eq!(engine.phase(), WizardPhase::Editing);
    assert_eq!(engine.current_step(), 3);
    assert_eq!(engine.field(FieldKey::Registration), Some("XYZ-111"));
    assert_eq!(engine.captures().len(), 1);
    assert!(engine.last_error().is_some());
    assert!(engine.pending_timer().is_none());

    engine.set_field(FieldKey::Registration, "XYZ-112").expect("edit");
    assert!(engine.last_error().is_none());
}

#[test]
fn close_refused_while_submitting() {
    let mut engine = WizardEngine::new(new_session_wizard(), confirmation()).expect("definition");
    engine.set_field(FieldKey::Registration, "XYZ-111").expect("plate");
    advance_to_last(&mut engine);
    engine.begin_submit().expect("begin");

    assert!(matches!(engine.close(), Err(WizardError::SubmitInFlight)));
    assert!(matches!(
        engine.begin_submit(),
        Err(WizardError::SubmitInFlight)
    ));
    assert_eq!(engine.phase(), WizardPhase::Submitting);
}

#[test]
fn manual_close_cancels_confirmation_timer() {
    let bay = warned_bay();
    let mut engine = WizardEngine::new(new_session_wizard(), confirmation()).expect("definition");
    engine.set_field(FieldKey::Registration, "XYZ-111").expect("plate");
    advance_to_last(&mut engine);
    let submission = engine.begin_submit().expect("begin");
    engine
        .complete_submit(build_record(&submission, &bay, t0()), t0())
        .expect("complete");
    let token = engine.pending_timer().map(|t| t.token()).expect("timer");

    engine.close().expect("close");
    assert!(engine.is_closed());
    assert!(!engine.fire(token));
    assert!(!engine.tick(t0() + Duration::seconds(10)));
}

//! Generic multi-step form engine.
//!
//! One engine instance drives one wizard from first step to closure:
//!
//! ```text
//! Editing ──submit──▶ Submitting ──ok──▶ Confirming ──timer──▶ Closed
//!    ▲                    │
//!    └──────failure───────┘
//! ```
//!
//! Closing while `Submitting` is refused. Closing from any other phase
//! cancels the pending confirmation timer and discards entered data.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ticket::EnforcementRecord;
use crate::metrics::METRICS;
use crate::obs;

use super::capture::{CaptureCategory, CaptureSlot, CaptureSlotStore, PhotoHandle, SlotId};
use super::definition::{CapturePolicy, FieldKey, SubmitMode, WizardDefinition, WizardKind};
use super::error::{SubmitFailure, ValidationError, WizardError, WizardResult};
use super::timer::{ScheduledTask, TimerToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    Editing,
    Submitting,
    Confirming,
    Closed,
}

impl fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WizardPhase::Editing => "editing",
            WizardPhase::Submitting => "submitting",
            WizardPhase::Confirming => "confirming",
            WizardPhase::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Everything the operator entered, handed to the submit handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub kind: WizardKind,
    pub fields: BTreeMap<FieldKey, String>,
    pub captures: Vec<CaptureSlot>,
}

impl Submission {
    pub fn field(&self, key: FieldKey) -> Option<&str> {
        self.fields.get(&key).map(String::as_str)
    }
}

/// Result of pressing Next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced { step: usize },
    /// Next on the last step of a submit-on-next wizard. The engine is now
    /// `Submitting` and waits for [`WizardEngine::complete_submit`].
    Submit(Submission),
}

/// Receives submissions and turns them into enforcement records.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn on_submit(&self, submission: &Submission) -> Result<EnforcementRecord, SubmitFailure>;
}

#[derive(Debug, Clone)]
pub struct WizardEngine {
    definition: WizardDefinition,
    step: usize,
    fields: BTreeMap<FieldKey, String>,
    captures: CaptureSlotStore,
    phase: WizardPhase,
    last_error: Option<SubmitFailure>,
    outcome: Option<EnforcementRecord>,
    pending: Option<ScheduledTask>,
    confirmation: Duration,
}

impl WizardEngine {
    /// Start a wizard at step 1. `confirmation` is how long the success
    /// message stays up before the wizard closes itself.
    pub fn new(definition: WizardDefinition, confirmation: Duration) -> WizardResult<Self> {
        definition.validate()?;
        Ok(Self {
            definition,
            step: 1,
            fields: BTreeMap::new(),
            captures: CaptureSlotStore::new(),
            phase: WizardPhase::Editing,
            last_error: None,
            outcome: None,
            pending: None,
            confirmation,
        })
    }

    /// Seed field values. Keys the definition does not know are dropped.
    pub fn with_prefill(mut self, prefill: BTreeMap<FieldKey, String>) -> Self {
        for (key, value) in prefill {
            if self.definition.has_field(key) && !key.is_capture() {
                self.store_value(key, &value);
            }
        }
        self
    }

    /// Seed previously taken photos.
    pub fn with_captures(
        mut self,
        captures: impl IntoIterator<Item = (Option<CaptureCategory>, PhotoHandle)>,
    ) -> Self {
        for (category, handle) in captures {
            self.insert_capture(category, handle);
        }
        self
    }

    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    pub fn kind(&self) -> WizardKind {
        self.definition.kind
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.definition.total_steps()
    }

    pub fn is_last_step(&self) -> bool {
        self.step == self.total_steps()
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == WizardPhase::Closed
    }

    pub fn field(&self, key: FieldKey) -> Option<&str> {
        self.fields.get(&key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<FieldKey, String> {
        &self.fields
    }

    pub fn captures(&self) -> &[CaptureSlot] {
        self.captures.slots()
    }

    /// The failure from the most recent submit attempt, cleared on edit.
    pub fn last_error(&self) -> Option<&SubmitFailure> {
        self.last_error.as_ref()
    }

    /// The record produced by a successful submit, while confirming.
    pub fn outcome(&self) -> Option<&EnforcementRecord> {
        self.outcome.as_ref()
    }

    pub fn pending_timer(&self) -> Option<&ScheduledTask> {
        self.pending.as_ref()
    }

    /// Required fields of `step` that have no value.
    pub fn missing_fields(&self, step: usize) -> Vec<FieldKey> {
        let Some(def) = self.definition.step_at(step) else {
            return Vec::new();
        };
        def.required
            .iter()
            .copied()
            .filter(|key| !self.is_satisfied(*key))
            .collect()
    }

    /// Fields shown on `step` whose value the field does not accept.
    pub fn invalid_fields(&self, step: usize) -> Vec<FieldKey> {
        let Some(def) = self.definition.step_at(step) else {
            return Vec::new();
        };
        def.fields
            .iter()
            .copied()
            .filter(|key| self.field(*key).is_some_and(|value| !key.accepts(value)))
            .collect()
    }

    pub fn set_field(&mut self, key: FieldKey, value: &str) -> WizardResult<()> {
        self.ensure_editing()?;
        if key.is_capture() || !self.definition.has_field(key) {
            return Err(WizardError::UnknownField(key));
        }
        self.store_value(key, value);
        self.last_error = None;
        Ok(())
    }

    pub fn clear_field(&mut self, key: FieldKey) -> WizardResult<()> {
        self.ensure_editing()?;
        if !self.definition.has_field(key) {
            return Err(WizardError::UnknownField(key));
        }
        self.fields.remove(&key);
        self.last_error = None;
        Ok(())
    }

    /// Write a scanner reading into the definition's scan target.
    pub fn apply_scan(&mut self, raw: &str) -> WizardResult<FieldKey> {
        let key = self.definition.scan_target.ok_or(WizardError::NoScanTarget)?;
        self.set_field(key, raw)?;
        Ok(key)
    }

    /// Attach a photo, applying the definition's capture policy.
    pub fn capture_photo(
        &mut self,
        category: Option<CaptureCategory>,
        handle: PhotoHandle,
    ) -> WizardResult<SlotId> {
        self.ensure_editing()?;
        self.last_error = None;
        Ok(self.insert_capture(category, handle))
    }

    pub fn remove_capture(&mut self, id: SlotId) -> WizardResult<Option<CaptureSlot>> {
        self.ensure_editing()?;
        Ok(self.captures.remove(id))
    }

    pub fn next(&mut self) -> WizardResult<NextOutcome> {
        self.ensure_editing()?;
        let total = self.total_steps();
        if self.step == total {
            return match self.definition.submit_mode {
                SubmitMode::OnNext => self.begin_submit().map(NextOutcome::Submit),
                SubmitMode::ExplicitReview => Err(WizardError::AtLastStep { total }),
            };
        }
        self.validate_step(self.step)?;
        let from = self.step;
        self.step += 1;
        obs::emit_wizard_step(self.kind().as_str(), from, self.step, total);
        Ok(NextOutcome::Advanced { step: self.step })
    }

    /// Go back one step. Entered values are kept.
    pub fn back(&mut self) -> WizardResult<usize> {
        self.ensure_editing()?;
        if self.step == 1 {
            return Err(WizardError::AtFirstStep);
        }
        let from = self.step;
        self.step -= 1;
        obs::emit_wizard_step(self.kind().as_str(), from, self.step, self.total_steps());
        Ok(self.step)
    }

    /// Validate everything and move to `Submitting`.
    pub fn begin_submit(&mut self) -> WizardResult<Submission> {
        match self.phase {
            WizardPhase::Editing => {}
            WizardPhase::Submitting => return Err(WizardError::SubmitInFlight),
            phase => return Err(WizardError::NotEditing { phase }),
        }
        let total = self.total_steps();
        if self.step != total {
            return Err(WizardError::NotAtLastStep {
                step: self.step,
                total,
            });
        }
        for step in 1..=total {
            self.validate_step(step)?;
        }
        self.phase = WizardPhase::Submitting;
        self.last_error = None;
        Ok(Submission {
            kind: self.kind(),
            fields: self.fields.clone(),
            captures: self.captures.slots().to_vec(),
        })
    }

    /// Resolve an in-flight submission.
    ///
    /// Success moves to `Confirming` and schedules the auto-close. Failure
    /// returns to `Editing` on the last step with every value intact.
    pub fn complete_submit(
        &mut self,
        result: Result<EnforcementRecord, SubmitFailure>,
        now: DateTime<Utc>,
    ) -> WizardResult<&EnforcementRecord> {
        if self.phase != WizardPhase::Submitting {
            return Err(WizardError::NotSubmitting { phase: self.phase });
        }
        match result {
            Ok(record) => {
                METRICS.inc_wizards_submitted();
                obs::emit_submit_finished(self.kind().as_str(), true, record.bay_id().as_str());
                self.phase = WizardPhase::Confirming;
                self.pending = Some(ScheduledTask::schedule(now, self.confirmation));
                Ok(self.outcome.insert(record))
            }
            Err(failure) => {
                METRICS.inc_submit_failures();
                obs::emit_submit_finished(self.kind().as_str(), false, &failure.to_string());
                self.phase = WizardPhase::Editing;
                self.last_error = Some(failure.clone());
                Err(WizardError::SubmitFailed(failure))
            }
        }
    }

    /// Submit from the last step through `handler`.
    pub async fn submit<H>(
        &mut self,
        handler: &H,
        now: DateTime<Utc>,
    ) -> WizardResult<&EnforcementRecord>
    where
        H: SubmitHandler + ?Sized,
    {
        let submission = self.begin_submit()?;
        let result = handler.on_submit(&submission).await;
        self.complete_submit(result, now)
    }

    /// Advance time. Returns true when the confirmation timer closed the wizard.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let due = self
            .pending
            .as_ref()
            .filter(|t| t.is_due(now))
            .map(ScheduledTask::token);
        match due {
            Some(token) => self.fire(token),
            None => false,
        }
    }

    /// Deliver a timer event. Tokens this engine does not own are ignored.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        let owned = self.pending.as_ref().is_some_and(|t| t.token() == token);
        if !owned || self.phase != WizardPhase::Confirming {
            METRICS.inc_late_timers_ignored();
            obs::emit_late_timer_ignored(token.value());
            return false;
        }
        obs::emit_confirmation_closed(self.kind().as_str());
        self.teardown();
        true
    }

    /// Close at the operator's request.
    pub fn close(&mut self) -> WizardResult<()> {
        if self.phase == WizardPhase::Submitting {
            return Err(WizardError::SubmitInFlight);
        }
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        self.pending = None;
        self.fields.clear();
        self.captures.clear();
        self.last_error = None;
        self.outcome = None;
        self.phase = WizardPhase::Closed;
    }

    fn ensure_editing(&self) -> WizardResult<()> {
        match self.phase {
            WizardPhase::Editing => Ok(()),
            WizardPhase::Submitting => Err(WizardError::SubmitInFlight),
            phase => Err(WizardError::NotEditing { phase }),
        }
    }

    fn validate_step(&self, step: usize) -> WizardResult<()> {
        let missing_fields = self.missing_fields(step);
        let invalid_fields = self.invalid_fields(step);
        if missing_fields.is_empty() && invalid_fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                step,
                missing_fields,
                invalid_fields,
            }
            .into())
        }
    }

    fn is_satisfied(&self, key: FieldKey) -> bool {
        if key.is_capture() {
            !self.captures.is_empty()
        } else {
            self.fields.contains_key(&key)
        }
    }

    fn store_value(&mut self, key: FieldKey, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.fields.remove(&key);
        } else {
            self.fields.insert(key, value.to_string());
        }
    }

    fn insert_capture(&mut self, category: Option<CaptureCategory>, handle: PhotoHandle) -> SlotId {
        if self.definition.capture_policy == CapturePolicy::OnePerCategory {
            for id in self.captures.slot_ids_in(category.as_ref()) {
                self.captures.remove(id);
            }
        }
        self.captures.add(category, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bay::BayId;
    use crate::domain::ticket::SessionChange;
    use crate::wizard::definition::StepDefinition;

    fn definition(mode: SubmitMode, policy: CapturePolicy) -> WizardDefinition {
        WizardDefinition::new(WizardKind::NewSession, mode, policy)
            .step(StepDefinition::new("Plate").required(FieldKey::Registration))
            .step(StepDefinition::new("Photos").required(FieldKey::Photos))
            .scan_into(FieldKey::Registration)
    }

    fn engine(mode: SubmitMode, policy: CapturePolicy) -> WizardEngine {
        WizardEngine::new(definition(mode, policy), Duration::milliseconds(2500)).unwrap()
    }

    fn record(plate: &str) -> EnforcementRecord {
        EnforcementRecord::Session(SessionChange::Created {
            bay_id: BayId::new("1"),
            registration: plate.to_string(),
            photos: Vec::new(),
        })
    }

    #[test]
    fn test_next_refused_until_required_set() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        let err = e.next().unwrap_err();
        assert_eq!(
            err,
            WizardError::Validation(ValidationError {
                step: 1,
                missing_fields: vec![FieldKey::Registration],
                invalid_fields: Vec::new(),
            })
        );
        assert_eq!(e.current_step(), 1);

        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        assert_eq!(e.next().unwrap(), NextOutcome::Advanced { step: 2 });
    }

    #[test]
    fn test_blank_value_counts_as_unset() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "   ").unwrap();
        assert!(e.field(FieldKey::Registration).is_none());
        assert!(e.next().is_err());
    }

    #[test]
    fn test_back_then_next_keeps_values() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        assert_eq!(e.back().unwrap(), 1);
        assert_eq!(e.field(FieldKey::Registration), Some("ABC123"));
        assert_eq!(e.next().unwrap(), NextOutcome::Advanced { step: 2 });
        assert_eq!(e.back().unwrap(), 1);
        assert_eq!(e.back().unwrap_err(), WizardError::AtFirstStep);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        assert_eq!(
            e.set_field(FieldKey::Notes, "x").unwrap_err(),
            WizardError::UnknownField(FieldKey::Notes)
        );
    }

    #[test]
    fn test_scan_writes_target() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        assert_eq!(e.apply_scan(" xyz111 ").unwrap(), FieldKey::Registration);
        assert_eq!(e.field(FieldKey::Registration), Some("xyz111"));
    }

    #[test]
    fn test_one_per_category_replaces() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::OnePerCategory);
        e.capture_photo(Some(CaptureCategory::License), PhotoHandle::new("a"))
            .unwrap();
        e.capture_photo(Some(CaptureCategory::License), PhotoHandle::new("b"))
            .unwrap();
        e.capture_photo(Some(CaptureCategory::Vehicle), PhotoHandle::new("c"))
            .unwrap();
        let handles: Vec<&str> = e.captures().iter().map(|s| s.handle.as_str()).collect();
        assert_eq!(handles, vec!["b", "c"]);
    }

    #[test]
    fn test_unbounded_appends() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.capture_photo(None, PhotoHandle::new("a")).unwrap();
        e.capture_photo(None, PhotoHandle::new("b")).unwrap();
        assert_eq!(e.captures().len(), 2);
    }

    #[test]
    fn test_submit_only_from_last_step() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        assert_eq!(
            e.begin_submit().unwrap_err(),
            WizardError::NotAtLastStep { step: 1, total: 2 }
        );
    }

    #[test]
    fn test_explicit_review_next_on_last_step() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        assert_eq!(e.next().unwrap_err(), WizardError::AtLastStep { total: 2 });
    }

    #[test]
    fn test_submit_on_next_enters_submitting() {
        let mut e = engine(SubmitMode::OnNext, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        e.capture_photo(None, PhotoHandle::new("a")).unwrap();
        let outcome = e.next().unwrap();
        assert!(matches!(outcome, NextOutcome::Submit(_)));
        assert_eq!(e.phase(), WizardPhase::Submitting);
        assert_eq!(e.next().unwrap_err(), WizardError::SubmitInFlight);
        assert_eq!(e.begin_submit().unwrap_err(), WizardError::SubmitInFlight);
        assert_eq!(e.close().unwrap_err(), WizardError::SubmitInFlight);
    }

    #[test]
    fn test_failure_returns_to_editing_with_data() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        e.capture_photo(None, PhotoHandle::new("a")).unwrap();
        e.begin_submit().unwrap();

        let err = e
            .complete_submit(Err(SubmitFailure::Unavailable("offline".into())), Utc::now())
            .unwrap_err();
        assert!(matches!(err, WizardError::SubmitFailed(_)));
        assert_eq!(e.phase(), WizardPhase::Editing);
        assert_eq!(e.current_step(), 2);
        assert_eq!(e.field(FieldKey::Registration), Some("ABC123"));
        assert_eq!(e.captures().len(), 1);
        assert!(e.last_error().is_some());

        // Retry succeeds.
        e.begin_submit().unwrap();
        e.complete_submit(Ok(record("ABC123")), Utc::now()).unwrap();
        assert_eq!(e.phase(), WizardPhase::Confirming);
        assert!(e.last_error().is_none());
    }

    #[test]
    fn test_confirmation_closes_after_delay() {
        let now = Utc::now();
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        e.capture_photo(None, PhotoHandle::new("a")).unwrap();
        e.begin_submit().unwrap();
        e.complete_submit(Ok(record("ABC123")), now).unwrap();

        assert!(!e.tick(now + Duration::milliseconds(2499)));
        assert_eq!(e.phase(), WizardPhase::Confirming);
        assert!(e.tick(now + Duration::milliseconds(2500)));
        assert!(e.is_closed());
        assert!(e.fields().is_empty());
        assert!(e.pending_timer().is_none());
    }

    #[test]
    fn test_close_cancels_timer_and_late_fire_ignored() {
        let now = Utc::now();
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        e.capture_photo(None, PhotoHandle::new("a")).unwrap();
        e.begin_submit().unwrap();
        e.complete_submit(Ok(record("ABC123")), now).unwrap();
        let token = e.pending_timer().unwrap().token();

        e.close().unwrap();
        assert!(e.is_closed());
        assert!(!e.fire(token));
        assert!(!e.tick(now + Duration::seconds(10)));
    }

    #[test]
    fn test_edits_refused_after_close() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.close().unwrap();
        assert_eq!(
            e.set_field(FieldKey::Registration, "A").unwrap_err(),
            WizardError::NotEditing {
                phase: WizardPhase::Closed
            }
        );
    }

    struct Accept;

    #[async_trait]
    impl SubmitHandler for Accept {
        async fn on_submit(
            &self,
            submission: &Submission,
        ) -> Result<EnforcementRecord, SubmitFailure> {
            let plate = submission
                .field(FieldKey::Registration)
                .ok_or_else(|| SubmitFailure::Invalid("no plate".into()))?;
            Ok(record(plate))
        }
    }

    #[tokio::test]
    async fn test_submit_through_handler() {
        let mut e = engine(SubmitMode::ExplicitReview, CapturePolicy::Unbounded);
        e.set_field(FieldKey::Registration, "ABC123").unwrap();
        e.next().unwrap();
        e.capture_photo(None, PhotoHandle::new("a")).unwrap();
        let rec = e.submit(&Accept, Utc::now()).await.unwrap().clone();
        assert_eq!(rec, record("ABC123"));
        assert_eq!(e.outcome(), Some(&rec));
    }
}

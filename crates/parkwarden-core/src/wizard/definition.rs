//! Step definitions that parameterise the wizard engine.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ticket::ViolationKind;

use super::error::{WizardError, WizardResult};

/// Input field of a wizard. The set of keys is fixed per definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Registration,
    BayNumber,
    Zone,
    ViolationKind,
    Notes,
    /// Satisfied by the capture store holding at least one photo.
    Photos,
}

impl FieldKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Registration => "registration",
            FieldKey::BayNumber => "bay_number",
            FieldKey::Zone => "zone",
            FieldKey::ViolationKind => "violation_kind",
            FieldKey::Notes => "notes",
            FieldKey::Photos => "photos",
        }
    }

    /// Whether values are held in the capture store rather than typed in.
    pub fn is_capture(&self) -> bool {
        matches!(self, FieldKey::Photos)
    }

    /// Whether `value` is acceptable for this field. Free-text fields take
    /// anything; the violation kind must name a known kind.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            FieldKey::ViolationKind => value.parse::<ViolationKind>().is_ok(),
            _ => true,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which guided flow a definition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardKind {
    NewSession,
    EditSession,
    IssueTicket,
}

impl WizardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardKind::NewSession => "new-session",
            WizardKind::EditSession => "edit-session",
            WizardKind::IssueTicket => "issue-ticket",
        }
    }
}

impl fmt::Display for WizardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the last step submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitMode {
    /// Next on the last step submits.
    OnNext,
    /// The last step is a review page with its own Submit action.
    ExplicitReview,
}

/// Cardinality of captured photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePolicy {
    /// One undifferentiated, growing list.
    Unbounded,
    /// Capturing into an occupied category replaces the earlier photo.
    OnePerCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub title: String,
    /// Fields shown on this step, in display order.
    pub fields: Vec<FieldKey>,
    pub required: BTreeSet<FieldKey>,
}

impl StepDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            required: BTreeSet::new(),
        }
    }

    pub fn required(mut self, key: FieldKey) -> Self {
        self.fields.push(key);
        self.required.insert(key);
        self
    }

    pub fn optional(mut self, key: FieldKey) -> Self {
        self.fields.push(key);
        self
    }
}

/// Complete description of one guided flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardDefinition {
    pub kind: WizardKind,
    pub steps: Vec<StepDefinition>,
    pub submit_mode: SubmitMode,
    pub capture_policy: CapturePolicy,
    /// Field that receives values from the scanner collaborator.
    pub scan_target: Option<FieldKey>,
}

impl WizardDefinition {
    pub fn new(kind: WizardKind, submit_mode: SubmitMode, capture_policy: CapturePolicy) -> Self {
        Self {
            kind,
            steps: Vec::new(),
            submit_mode,
            capture_policy,
            scan_target: None,
        }
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    pub fn scan_into(mut self, key: FieldKey) -> Self {
        self.scan_target = Some(key);
        self
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Look up a step by its 1-indexed number.
    pub fn step_at(&self, step: usize) -> Option<&StepDefinition> {
        step.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// All field keys the definition knows about.
    pub fn field_keys(&self) -> BTreeSet<FieldKey> {
        self.steps.iter().flat_map(|s| s.fields.iter().copied()).collect()
    }

    pub fn has_field(&self, key: FieldKey) -> bool {
        self.steps.iter().any(|s| s.fields.contains(&key))
    }

    pub fn validate(&self) -> WizardResult<()> {
        if self.steps.is_empty() {
            return Err(WizardError::InvalidDefinition(format!(
                "{} has no steps",
                self.kind
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            if let Some(key) = step.required.iter().find(|k| !step.fields.contains(k)) {
                return Err(WizardError::InvalidDefinition(format!(
                    "step {} requires {} but does not show it",
                    i + 1,
                    key
                )));
            }
        }
        if let Some(key) = self.scan_target {
            if key.is_capture() || !self.has_field(key) {
                return Err(WizardError::InvalidDefinition(format!(
                    "scan target {key} is not a text field of {}",
                    self.kind
                )));
            }
        }
        Ok(())
    }
}

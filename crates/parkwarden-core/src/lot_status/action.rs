//! Operator actions on a bay.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Action identifier, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    AddSession,
    ConfirmCompliance,
    EditSession,
    EndSession,
    IssueTicket,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::AddSession => "add-session",
            ActionKind::ConfirmCompliance => "confirm-compliance",
            ActionKind::EditSession => "edit-session",
            ActionKind::EndSession => "end-session",
            ActionKind::IssueTicket => "issue-ticket",
        }
    }

    /// Whether the action is carried out by a guided wizard rather than
    /// applied immediately.
    pub fn opens_wizard(&self) -> bool {
        matches!(
            self,
            ActionKind::AddSession | ActionKind::EditSession | ActionKind::IssueTicket
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action together with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum LotAction {
    AddSession {
        registration: String,
    },
    EditSession {
        registration: String,
        bay_number: String,
        zone_id: String,
    },
    ConfirmCompliance,
    EndSession,
    IssueTicket,
}

impl LotAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            LotAction::AddSession { .. } => ActionKind::AddSession,
            LotAction::EditSession { .. } => ActionKind::EditSession,
            LotAction::ConfirmCompliance => ActionKind::ConfirmCompliance,
            LotAction::EndSession => ActionKind::EndSession,
            LotAction::IssueTicket => ActionKind::IssueTicket,
        }
    }
}

/// Set of actions legal for a bay, in stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<ActionKind>);

impl ActionSet {
    pub fn contains(&self, kind: ActionKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = ActionKind> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ActionKind> for ActionSet {
    fn from_iter<I: IntoIterator<Item = ActionKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[ActionKind; N]> for ActionSet {
    fn from(kinds: [ActionKind; N]) -> Self {
        kinds.into_iter().collect()
    }
}

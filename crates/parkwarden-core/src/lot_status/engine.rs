//! Lot status engine: which actions a bay allows and what they do to it.

use crate::domain::bay::{normalize_registration, Bay, BayState, BayStatus};
use crate::metrics::METRICS;
use crate::obs;

use super::action::{ActionKind, ActionSet, LotAction};
use super::error::{LotResult, LotStatusError};
use super::policy::TicketPolicy;

/// Legal actions for a status/warning pair.
///
/// | status      | warning | actions                                        |
/// |-------------|---------|------------------------------------------------|
/// | empty       | -       | add-session                                    |
/// | new-session | no      | confirm-compliance, edit-session               |
/// | new-session | yes     | confirm-compliance, edit-session, issue-ticket |
/// | compliant   | -       | end-session                                    |
/// | overstay    | -       | end-session, issue-ticket                      |
/// | violation   | -       | issue-ticket                                   |
pub fn legal_actions_for(status: BayStatus, has_warning: bool) -> ActionSet {
    match status {
        BayStatus::Empty => ActionSet::from([ActionKind::AddSession]),
        BayStatus::NewSession if has_warning => ActionSet::from([
            ActionKind::ConfirmCompliance,
            ActionKind::EditSession,
            ActionKind::IssueTicket,
        ]),
        BayStatus::NewSession => {
            ActionSet::from([ActionKind::ConfirmCompliance, ActionKind::EditSession])
        }
        BayStatus::Compliant => ActionSet::from([ActionKind::EndSession]),
        BayStatus::Overstay => ActionSet::from([ActionKind::EndSession, ActionKind::IssueTicket]),
        BayStatus::Violation => ActionSet::from([ActionKind::IssueTicket]),
    }
}

pub fn legal_actions(bay: &Bay) -> ActionSet {
    legal_actions_for(bay.status(), bay.has_warning())
}

/// Fail with `InvalidTransition` unless `kind` is legal for `bay`.
pub fn ensure_legal(bay: &Bay, kind: ActionKind) -> LotResult<()> {
    if legal_actions(bay).contains(kind) {
        return Ok(());
    }
    METRICS.inc_transitions_rejected();
    obs::emit_transition_rejected(bay.id.as_str(), kind.as_str(), bay.status().as_str());
    Err(LotStatusError::InvalidTransition {
        bay_id: bay.id.clone(),
        status: bay.status(),
        action: kind,
    })
}

/// Compute the bay that results from applying `action`.
///
/// The input is never modified; on error no new bay exists.
pub fn apply_action(bay: &Bay, action: &LotAction) -> LotResult<Bay> {
    ensure_legal(bay, action.kind())?;

    let mut next = bay.clone();
    let state = match (bay.state(), action) {
        (BayState::Empty, LotAction::AddSession { registration }) => BayState::NewSession {
            registration: require_plate(registration)?,
            has_warning: false,
            remaining: None,
        },
        (
            BayState::NewSession {
                has_warning,
                remaining,
                ..
            },
            LotAction::EditSession {
                registration,
                bay_number,
                zone_id,
            },
        ) => {
            next.number = require_value(bay_number, "bay number")?;
            next.zone_id = require_value(zone_id, "zone")?;
            BayState::NewSession {
                registration: require_plate(registration)?,
                has_warning: *has_warning,
                remaining: *remaining,
            }
        }
        (BayState::NewSession { registration, .. }, LotAction::ConfirmCompliance) => {
            BayState::Compliant {
                registration: registration.clone(),
                remaining: None,
            }
        }
        (BayState::Compliant { .. } | BayState::Overstay { .. }, LotAction::EndSession) => {
            BayState::Empty
        }
        (state, LotAction::IssueTicket) => state.clone(),
        _ => {
            return Err(LotStatusError::InvalidTransition {
                bay_id: bay.id.clone(),
                status: bay.status(),
                action: action.kind(),
            })
        }
    };
    next.set_state(state);

    METRICS.inc_transitions_applied();
    obs::emit_bay_transition(
        bay.id.as_str(),
        action.kind().as_str(),
        bay.status().as_str(),
        next.status().as_str(),
    );
    Ok(next)
}

/// Apply the integrator's ticket policy to a bay a ticket was just issued for.
pub fn after_ticket_issued(bay: &Bay, policy: TicketPolicy) -> LotResult<Bay> {
    ensure_legal(bay, ActionKind::IssueTicket)?;
    let mut next = bay.clone();
    if policy == TicketPolicy::MarkViolation {
        let registration = bay
            .registration()
            .ok_or(LotStatusError::EmptyRegistration)?
            .to_string();
        next.set_state(BayState::Violation { registration });
        obs::emit_bay_transition(
            bay.id.as_str(),
            "ticket-policy",
            bay.status().as_str(),
            next.status().as_str(),
        );
    }
    Ok(next)
}

fn require_plate(raw: &str) -> LotResult<String> {
    normalize_registration(raw).ok_or(LotStatusError::EmptyRegistration)
}

fn require_value(raw: &str, field: &'static str) -> LotResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(LotStatusError::MissingValue { field });
    }
    Ok(value.to_string())
}

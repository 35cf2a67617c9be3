//! Structured observability hooks for console navigation and enforcement events.
//!
//! This module provides:
//! - An operator-session span via the `ConsoleSpan` RAII guard
//! - Emission functions for lifecycle events: bay transitions, overlay
//!   changes, wizard steps, submissions and confirmation timers
//!
//! Events are emitted at `info!` level (`debug!` for chatty navigation).
//! For JSON output, set `PARKWARDEN_LOG_FORMAT=json`.

use tracing::{debug, info, warn};

/// RAII guard that enters a span tagged with the operator session id.
///
/// # Example
///
/// ```ignore
/// let _span = ConsoleSpan::enter("shift-0800");
/// // Every event below is associated with session_id = "shift-0800"
/// ```
pub struct ConsoleSpan {
    _span: tracing::span::EnteredSpan,
}

impl ConsoleSpan {
    pub fn enter(session_id: &str) -> Self {
        let span = tracing::info_span!("parkwarden.console", session_id = %session_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a bay moved between lifecycle states.
pub fn emit_bay_transition(bay_id: &str, action: &str, from: &str, to: &str) {
    info!(
        event = "bay.transition",
        bay_id = %bay_id,
        action = %action,
        from = %from,
        to = %to,
    );
}

/// Emit event: a requested action was not legal for the bay (warning level).
pub fn emit_transition_rejected(bay_id: &str, action: &str, status: &str) {
    warn!(
        event = "bay.transition_rejected",
        bay_id = %bay_id,
        action = %action,
        status = %status,
    );
}

pub fn emit_overlay_pushed(kind: &str, depth: usize) {
    debug!(event = "overlay.pushed", kind = %kind, depth = depth);
}

pub fn emit_overlay_popped(kind: &str, depth: usize) {
    debug!(event = "overlay.popped", kind = %kind, depth = depth);
}

pub fn emit_view_switched(from: &str, to: &str, discarded_overlays: usize) {
    info!(
        event = "view.switched",
        from = %from,
        to = %to,
        discarded_overlays = discarded_overlays,
    );
}

/// Emit event: the wizard moved to another step.
pub fn emit_wizard_step(wizard: &str, from: usize, to: usize, total: usize) {
    debug!(
        event = "wizard.step",
        wizard = %wizard,
        from = from,
        to = to,
        total = total,
    );
}

/// Emit event: a submission completed, successfully or not.
pub fn emit_submit_finished(wizard: &str, success: bool, detail: &str) {
    if success {
        info!(event = "wizard.submitted", wizard = %wizard, record = %detail);
    } else {
        warn!(event = "wizard.submit_failed", wizard = %wizard, error = %detail);
    }
}

/// Emit event: the confirmation timer closed a wizard.
pub fn emit_confirmation_closed(wizard: &str) {
    info!(event = "wizard.closed", wizard = %wizard);
}

/// Emit event: a timer fired for a wizard that no longer owns it.
pub fn emit_late_timer_ignored(token: u64) {
    debug!(event = "timer.ignored", token = token);
}

//! Global atomic counters for console observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of an operator shift).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters, updated without allocating or locking.
pub struct Metrics {
    transitions_applied: AtomicU64,
    transitions_rejected: AtomicU64,
    wizards_submitted: AtomicU64,
    submit_failures: AtomicU64,
    late_timers_ignored: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            transitions_applied: AtomicU64::new(0),
            transitions_rejected: AtomicU64::new(0),
            wizards_submitted: AtomicU64::new(0),
            submit_failures: AtomicU64::new(0),
            late_timers_ignored: AtomicU64::new(0),
        }
    }

    pub fn inc_transitions_applied(&self) {
        self.transitions_applied.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "transitions_applied", "counter incremented");
    }

    pub fn inc_transitions_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "transitions_rejected", "counter incremented");
    }

    pub fn inc_wizards_submitted(&self) {
        self.wizards_submitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "wizards_submitted", "counter incremented");
    }

    pub fn inc_submit_failures(&self) {
        self.submit_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "submit_failures", "counter incremented");
    }

    pub fn inc_late_timers_ignored(&self) {
        self.late_timers_ignored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "late_timers_ignored", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            transitions_applied = self.transitions_applied(),
            transitions_rejected = self.transitions_rejected(),
            wizards_submitted = self.wizards_submitted(),
            submit_failures = self.submit_failures(),
            late_timers_ignored = self.late_timers_ignored(),
        );
    }

    pub fn transitions_applied(&self) -> u64 {
        self.transitions_applied.load(Ordering::Relaxed)
    }

    pub fn transitions_rejected(&self) -> u64 {
        self.transitions_rejected.load(Ordering::Relaxed)
    }

    pub fn wizards_submitted(&self) -> u64 {
        self.wizards_submitted.load(Ordering::Relaxed)
    }

    pub fn submit_failures(&self) -> u64 {
        self.submit_failures.load(Ordering::Relaxed)
    }

    pub fn late_timers_ignored(&self) -> u64 {
        self.late_timers_ignored.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.transitions_applied.store(0, Ordering::Relaxed);
        self.transitions_rejected.store(0, Ordering::Relaxed);
        self.wizards_submitted.store(0, Ordering::Relaxed);
        self.submit_failures.store(0, Ordering::Relaxed);
        self.late_timers_ignored.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.transitions_applied(), 0);
        m.inc_transitions_applied();
        m.inc_transitions_applied();
        assert_eq!(m.transitions_applied(), 2);

        m.inc_transitions_rejected();
        assert_eq!(m.transitions_rejected(), 1);

        m.inc_wizards_submitted();
        m.inc_submit_failures();
        m.inc_late_timers_ignored();
        assert_eq!(m.wizards_submitted(), 1);
        assert_eq!(m.submit_failures(), 1);
        assert_eq!(m.late_timers_ignored(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_transitions_applied();
        m.inc_wizards_submitted();
        m.inc_late_timers_ignored();
        m.reset();
        assert_eq!(m.transitions_applied(), 0);
        assert_eq!(m.wizards_submitted(), 0);
        assert_eq!(m.late_timers_ignored(), 0);
    }
}

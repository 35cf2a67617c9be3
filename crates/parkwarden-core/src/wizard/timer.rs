//! Cancellable deferred tasks for the confirmation auto-close.
//!
//! A task is plain data owned by whoever scheduled it. Dropping the owner
//! cancels the task; a timer event carrying a token nobody owns any more is
//! ignored.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of one scheduled task. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerToken(u64);

impl TimerToken {
    fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    token: TimerToken,
    due_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn schedule(now: DateTime<Utc>, delay: Duration) -> Self {
        Self {
            token: TimerToken::next(),
            due_at: now + delay,
        }
    }

    pub fn token(&self) -> TimerToken {
        self.token
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_at
    }
}

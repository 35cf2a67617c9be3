//! What happens to a bay after a ticket is issued against it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Integrator policy mapping "ticket issued" onto the bay lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketPolicy {
    /// The ticket is a side record; the bay keeps its status.
    #[default]
    KeepStatus,
    /// The bay moves to `violation` once a ticket exists for it.
    MarkViolation,
}

impl fmt::Display for TicketPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketPolicy::KeepStatus => f.write_str("keep-status"),
            TicketPolicy::MarkViolation => f.write_str("mark-violation"),
        }
    }
}

impl FromStr for TicketPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keep-status" | "keep" => Ok(TicketPolicy::KeepStatus),
            "mark-violation" | "violation" => Ok(TicketPolicy::MarkViolation),
            other => Err(format!("unknown ticket policy: {other}")),
        }
    }
}

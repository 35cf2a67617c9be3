//! Enforcement records produced by wizard submissions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::wizard::capture::CaptureSlot;

use super::bay::BayId;

/// Reason a ticket is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    Overstay,
    NoPayment,
    WrongInfo,
    Other,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Overstay => "overstay",
            ViolationKind::NoPayment => "no-payment",
            ViolationKind::WrongInfo => "wrong-info",
            ViolationKind::Other => "other",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "overstay" => Ok(ViolationKind::Overstay),
            "no-payment" | "not-paid" => Ok(ViolationKind::NoPayment),
            "wrong-info" => Ok(ViolationKind::WrongInfo),
            "other" => Ok(ViolationKind::Other),
            other => Err(format!("unknown violation kind: {other}")),
        }
    }
}

/// Generated ticket identifier, e.g. `TKT-3F2A9C1B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(format!("TKT-{}", raw[..8].to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated ticket contents before an id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub bay_id: BayId,
    pub registration: String,
    pub bay_number: String,
    pub zone_id: String,
    pub violation_kind: ViolationKind,
    pub notes: Option<String>,
    pub photos: Vec<CaptureSlot>,
}

/// An issued violation ticket. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    ticket_id: TicketId,
    bay_id: BayId,
    registration: String,
    bay_number: String,
    zone_id: String,
    violation_kind: ViolationKind,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
    photos: Vec<CaptureSlot>,
    /// SHA-256 over the ticket fields for tamper evidence.
    content_digest: String,
}

impl Ticket {
    pub fn issue(draft: TicketDraft, now: DateTime<Utc>) -> Self {
        let mut ticket = Self {
            ticket_id: TicketId::generate(),
            bay_id: draft.bay_id,
            registration: draft.registration,
            bay_number: draft.bay_number,
            zone_id: draft.zone_id,
            violation_kind: draft.violation_kind,
            occurred_at: now,
            notes: draft.notes,
            photos: draft.photos,
            content_digest: String::new(),
        };
        ticket.content_digest = ticket.compute_digest();
        ticket
    }

    pub fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    pub fn bay_id(&self) -> &BayId {
        &self.bay_id
    }

    pub fn registration(&self) -> &str {
        &self.registration
    }

    pub fn bay_number(&self) -> &str {
        &self.bay_number
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn violation_kind(&self) -> ViolationKind {
        self.violation_kind
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn photos(&self) -> &[CaptureSlot] {
        &self.photos
    }

    pub fn content_digest(&self) -> &str {
        &self.content_digest
    }

    fn compute_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.ticket_id.as_str(),
            self.bay_id.as_str(),
            &self.registration,
            &self.bay_number,
            &self.zone_id,
            self.violation_kind.as_str(),
            &self.occurred_at.to_rfc3339(),
            self.notes.as_deref().unwrap_or(""),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(b"\0");
        }
        for photo in &self.photos {
            hasher.update(photo.handle.as_str().as_bytes());
            hasher.update(b"\0");
        }
        hex::encode(hasher.finalize())
    }

    pub fn verify_integrity(&self) -> bool {
        self.content_digest == self.compute_digest()
    }
}

/// A change to a bay's session produced by the session wizards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionChange {
    Created {
        bay_id: BayId,
        registration: String,
        photos: Vec<CaptureSlot>,
    },
    Edited {
        bay_id: BayId,
        registration: String,
        bay_number: String,
        zone_id: String,
    },
}

impl SessionChange {
    pub fn bay_id(&self) -> &BayId {
        match self {
            SessionChange::Created { bay_id, .. } | SessionChange::Edited { bay_id, .. } => bay_id,
        }
    }

    pub fn registration(&self) -> &str {
        match self {
            SessionChange::Created { registration, .. }
            | SessionChange::Edited { registration, .. } => registration,
        }
    }
}

/// What a successful wizard submission produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum EnforcementRecord {
    Ticket(Ticket),
    Session(SessionChange),
}

impl EnforcementRecord {
    pub fn bay_id(&self) -> &BayId {
        match self {
            EnforcementRecord::Ticket(t) => t.bay_id(),
            EnforcementRecord::Session(s) => s.bay_id(),
        }
    }
}

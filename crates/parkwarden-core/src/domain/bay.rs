//! Parking bays and their enforcement lifecycle state.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Stable identifier of a bay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BayId(String);

impl BayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BayId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Status tag of a bay, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BayStatus {
    Empty,
    NewSession,
    Compliant,
    Overstay,
    Violation,
}

impl BayStatus {
    pub const ALL: [BayStatus; 5] = [
        BayStatus::Empty,
        BayStatus::NewSession,
        BayStatus::Compliant,
        BayStatus::Overstay,
        BayStatus::Violation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BayStatus::Empty => "empty",
            BayStatus::NewSession => "new-session",
            BayStatus::Compliant => "compliant",
            BayStatus::Overstay => "overstay",
            BayStatus::Violation => "violation",
        }
    }
}

impl fmt::Display for BayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "empty" => Ok(BayStatus::Empty),
            "new-session" | "newsession" => Ok(BayStatus::NewSession),
            "compliant" => Ok(BayStatus::Compliant),
            "overstay" => Ok(BayStatus::Overstay),
            "violation" => Ok(BayStatus::Violation),
            other => Err(format!("unknown bay status: {other}")),
        }
    }
}

/// Lifecycle state of a bay.
///
/// Each variant carries exactly the data that is meaningful for it: an
/// empty bay has no registration, and only a new session can carry the
/// manual-override warning flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BayState {
    Empty,
    NewSession {
        registration: String,
        #[serde(default)]
        has_warning: bool,
        #[serde(default, with = "remaining_secs")]
        remaining: Option<Duration>,
    },
    Compliant {
        registration: String,
        #[serde(default, with = "remaining_secs")]
        remaining: Option<Duration>,
    },
    Overstay {
        registration: String,
        #[serde(default, with = "remaining_secs")]
        remaining: Option<Duration>,
    },
    Violation {
        registration: String,
    },
}

impl BayState {
    pub fn status(&self) -> BayStatus {
        match self {
            BayState::Empty => BayStatus::Empty,
            BayState::NewSession { .. } => BayStatus::NewSession,
            BayState::Compliant { .. } => BayStatus::Compliant,
            BayState::Overstay { .. } => BayStatus::Overstay,
            BayState::Violation { .. } => BayStatus::Violation,
        }
    }

    pub fn registration(&self) -> Option<&str> {
        match self {
            BayState::Empty => None,
            BayState::NewSession { registration, .. }
            | BayState::Compliant { registration, .. }
            | BayState::Overstay { registration, .. }
            | BayState::Violation { registration } => Some(registration),
        }
    }

    /// Always `false` outside of a new session.
    pub fn has_warning(&self) -> bool {
        matches!(
            self,
            BayState::NewSession {
                has_warning: true,
                ..
            }
        )
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self {
            BayState::NewSession { remaining, .. }
            | BayState::Compliant { remaining, .. }
            | BayState::Overstay { remaining, .. } => *remaining,
            BayState::Empty | BayState::Violation { .. } => None,
        }
    }
}

/// One physical parking space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bay {
    pub id: BayId,
    /// Display label, e.g. `B-042`.
    pub number: String,
    pub zone_id: String,
    #[serde(flatten)]
    state: BayState,
}

impl Bay {
    pub fn new(
        id: impl Into<BayId>,
        number: impl Into<String>,
        zone_id: impl Into<String>,
        state: BayState,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            zone_id: zone_id.into(),
            state,
        }
    }

    /// Create an unoccupied bay.
    pub fn empty(
        id: impl Into<BayId>,
        number: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        Self::new(id, number, zone_id, BayState::Empty)
    }

    pub fn state(&self) -> &BayState {
        &self.state
    }

    pub fn status(&self) -> BayStatus {
        self.state.status()
    }

    pub fn registration(&self) -> Option<&str> {
        self.state.registration()
    }

    pub fn has_warning(&self) -> bool {
        self.state.has_warning()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.state.remaining()
    }

    /// Replace the lifecycle state. Only the lot status engine calls this.
    pub(crate) fn set_state(&mut self, state: BayState) {
        self.state = state;
    }

    /// Freeze the fields an overlay needs to render this bay.
    pub fn snapshot(&self) -> BaySnapshot {
        BaySnapshot {
            bay_id: self.id.clone(),
            bay_number: self.number.clone(),
            zone_id: self.zone_id.clone(),
            status: self.status(),
            has_warning: self.has_warning(),
            registration: self.registration().map(str::to_string),
        }
    }
}

impl From<String> for BayId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Point-in-time copy of a bay, carried by overlay descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaySnapshot {
    pub bay_id: BayId,
    pub bay_number: String,
    pub zone_id: String,
    pub status: BayStatus,
    pub has_warning: bool,
    pub registration: Option<String>,
}

/// Normalise operator-entered plate text: trimmed and uppercased.
///
/// Returns `None` for blank input.
pub fn normalize_registration(raw: &str) -> Option<String> {
    let plate = raw.trim().to_uppercase();
    if plate.is_empty() {
        None
    } else {
        Some(plate)
    }
}

/// Serialise `Option<Duration>` as whole seconds.
mod remaining_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

//! Stacked overlay descriptors above the base view.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::bay::{BayId, BaySnapshot};
use crate::domain::zone::ZoneSelected;
use crate::filter::BayStatusFacet;
use crate::obs;
use crate::wizard::WizardKind;

/// An overlay with its snapshotted parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Overlay {
    Search,
    Scanner,
    Menu,
    ZoneDetail {
        zone: ZoneSelected,
        #[serde(default)]
        status_filter: BayStatusFacet,
    },
    LotDetail {
        bay: BaySnapshot,
    },
    PastViolations {
        bay: BaySnapshot,
    },
    Wizard {
        wizard: WizardKind,
        bay: BaySnapshot,
    },
    Confirmation {
        wizard: WizardKind,
        message: String,
    },
}

/// Parameter-free tag of an [`Overlay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    Search,
    Scanner,
    Menu,
    ZoneDetail,
    LotDetail,
    PastViolations,
    Wizard,
    Confirmation,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Search => "search",
            OverlayKind::Scanner => "scanner",
            OverlayKind::Menu => "menu",
            OverlayKind::ZoneDetail => "zone-detail",
            OverlayKind::LotDetail => "lot-detail",
            OverlayKind::PastViolations => "past-violations",
            OverlayKind::Wizard => "wizard",
            OverlayKind::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one overlay per family is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayFamily {
    Search,
    Scanner,
    Menu,
    Zone,
    Lot,
    /// Past violations and the three wizards.
    Workflow,
}

impl Overlay {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::Search => OverlayKind::Search,
            Overlay::Scanner => OverlayKind::Scanner,
            Overlay::Menu => OverlayKind::Menu,
            Overlay::ZoneDetail { .. } => OverlayKind::ZoneDetail,
            Overlay::LotDetail { .. } => OverlayKind::LotDetail,
            Overlay::PastViolations { .. } => OverlayKind::PastViolations,
            Overlay::Wizard { .. } => OverlayKind::Wizard,
            Overlay::Confirmation { .. } => OverlayKind::Confirmation,
        }
    }

    /// `None` for confirmations, which stack above anything.
    pub fn family(&self) -> Option<OverlayFamily> {
        match self {
            Overlay::Search => Some(OverlayFamily::Search),
            Overlay::Scanner => Some(OverlayFamily::Scanner),
            Overlay::Menu => Some(OverlayFamily::Menu),
            Overlay::ZoneDetail { .. } => Some(OverlayFamily::Zone),
            Overlay::LotDetail { .. } => Some(OverlayFamily::Lot),
            Overlay::PastViolations { .. } | Overlay::Wizard { .. } => {
                Some(OverlayFamily::Workflow)
            }
            Overlay::Confirmation { .. } => None,
        }
    }

    /// The bay snapshot this overlay renders, if any.
    pub fn bay(&self) -> Option<&BaySnapshot> {
        match self {
            Overlay::LotDetail { bay }
            | Overlay::PastViolations { bay }
            | Overlay::Wizard { bay, .. } => Some(bay),
            _ => None,
        }
    }

    fn bay_mut(&mut self) -> Option<&mut BaySnapshot> {
        match self {
            Overlay::LotDetail { bay }
            | Overlay::PastViolations { bay }
            | Overlay::Wizard { bay, .. } => Some(bay),
            _ => None,
        }
    }
}

/// Ordered overlays; the last entry is visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayStack {
    entries: Vec<Overlay>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an overlay. An open overlay of the same family is replaced,
    /// together with anything stacked above it.
    pub fn push(&mut self, overlay: Overlay) {
        if let Some(family) = overlay.family() {
            if let Some(index) = self.position_of(family) {
                self.truncate(index);
            }
        }
        let kind = overlay.kind();
        self.entries.push(overlay);
        obs::emit_overlay_pushed(kind.as_str(), self.entries.len());
    }

    pub fn replace_top(&mut self, overlay: Overlay) {
        self.pop();
        self.push(overlay);
    }

    /// Remove the visible overlay. No-op on an empty stack.
    pub fn pop(&mut self) -> Option<Overlay> {
        let popped = self.entries.pop()?;
        obs::emit_overlay_popped(popped.kind().as_str(), self.entries.len());
        Some(popped)
    }

    /// Close the overlay of `family` and everything above it.
    pub fn pop_through(&mut self, family: OverlayFamily) -> usize {
        match self.position_of(family) {
            Some(index) => self.truncate(index),
            None => 0,
        }
    }

    /// Empty the stack, returning how many overlays were closed.
    pub fn pop_all(&mut self) -> usize {
        self.truncate(0)
    }

    pub fn top(&self) -> Option<&Overlay> {
        self.entries.last()
    }

    pub fn top_kind(&self) -> Option<OverlayKind> {
        self.top().map(Overlay::kind)
    }

    pub fn contains(&self, kind: OverlayKind) -> bool {
        self.entries.iter().any(|o| o.kind() == kind)
    }

    pub fn find(&self, family: OverlayFamily) -> Option<&Overlay> {
        self.entries.iter().find(|o| o.family() == Some(family))
    }

    pub fn find_mut(&mut self, family: OverlayFamily) -> Option<&mut Overlay> {
        self.entries.iter_mut().find(|o| o.family() == Some(family))
    }

    /// Swap in a fresh snapshot on every overlay showing `bay`.
    pub fn refresh_bay(&mut self, bay: &BaySnapshot) -> usize {
        let mut refreshed = 0;
        for slot in self.entries.iter_mut().filter_map(Overlay::bay_mut) {
            if slot.bay_id == bay.bay_id {
                *slot = bay.clone();
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Whether pushing `overlay` would close the open overlay of `family`.
    pub fn evicts(&self, overlay: &Overlay, family: OverlayFamily) -> bool {
        let Some(target) = self.position_of(family) else {
            return false;
        };
        overlay
            .family()
            .and_then(|f| self.position_of(f))
            .is_some_and(|index| index <= target)
    }

    pub fn shows_bay(&self, id: &BayId) -> bool {
        self.entries
            .iter()
            .filter_map(Overlay::bay)
            .any(|b| &b.bay_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.entries.iter()
    }

    fn position_of(&self, family: OverlayFamily) -> Option<usize> {
        self.entries.iter().position(|o| o.family() == Some(family))
    }

    fn truncate(&mut self, len: usize) -> usize {
        let mut closed = 0;
        while self.entries.len() > len {
            self.pop();
            closed += 1;
        }
        closed
    }
}

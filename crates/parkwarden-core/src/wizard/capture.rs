//! Photo attachment slots filled by the camera collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a captured photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureCategory {
    License,
    Vehicle,
    LotNumber,
    Other(String),
}

impl fmt::Display for CaptureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureCategory::License => f.write_str("license"),
            CaptureCategory::Vehicle => f.write_str("vehicle"),
            CaptureCategory::LotNumber => f.write_str("lot-number"),
            CaptureCategory::Other(name) => f.write_str(name),
        }
    }
}

/// Opaque photo reference handed over by the camera collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoHandle(String);

impl PhotoHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Store-local identifier of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(u64);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// A filled attachment slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSlot {
    pub id: SlotId,
    /// `None` for flows that keep one undifferentiated list.
    pub category: Option<CaptureCategory>,
    pub handle: PhotoHandle,
}

/// Ordered collection of capture slots.
///
/// The store enforces no cardinality; per-category limits are the wizard
/// definition's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSlotStore {
    slots: Vec<CaptureSlot>,
    next_id: u64,
}

impl CaptureSlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: Option<CaptureCategory>, handle: PhotoHandle) -> SlotId {
        self.next_id += 1;
        let id = SlotId(self.next_id);
        self.slots.push(CaptureSlot {
            id,
            category,
            handle,
        });
        id
    }

    /// Remove a slot by id. Unknown ids are ignored.
    pub fn remove(&mut self, id: SlotId) -> Option<CaptureSlot> {
        let index = self.slots.iter().position(|s| s.id == id)?;
        Some(self.slots.remove(index))
    }

    pub fn by_category(&self, category: Option<&CaptureCategory>) -> Vec<&PhotoHandle> {
        self.slots
            .iter()
            .filter(|s| s.category.as_ref() == category)
            .map(|s| &s.handle)
            .collect()
    }

    pub fn slot_ids_in(&self, category: Option<&CaptureCategory>) -> Vec<SlotId> {
        self.slots
            .iter()
            .filter(|s| s.category.as_ref() == category)
            .map(|s| s.id)
            .collect()
    }

    pub fn slots(&self) -> &[CaptureSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

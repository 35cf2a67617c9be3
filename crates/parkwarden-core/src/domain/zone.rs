//! Zones as supplied by the map collaborator.

use serde::{Deserialize, Serialize};

/// A named grouping of bays. Read-only for the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub available_count: u32,
    pub total_count: u32,
    pub price_per_hour: String,
}

impl Zone {
    pub fn is_full(&self) -> bool {
        self.available_count == 0
    }

    /// The event the map collaborator emits when this zone is tapped.
    pub fn selected(&self) -> ZoneSelected {
        ZoneSelected {
            id: self.id.clone(),
            name: self.name.clone(),
            available_count: self.available_count,
            total_count: self.total_count,
            price_per_hour: self.price_per_hour.clone(),
        }
    }
}

/// Payload of a zone tap on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSelected {
    pub id: String,
    pub name: String,
    pub available_count: u32,
    pub total_count: u32,
    pub price_per_hour: String,
}

//! Faceted filtering shared by every list surface.
//!
//! Each facet is an independent predicate; [`apply`] keeps the items every
//! facet accepts, in input order. An `All` or unset facet accepts everything.

use serde::{Deserialize, Serialize};

use crate::domain::bay::{Bay, BayStatus};
use crate::domain::zone::Zone;

/// One filter predicate.
pub trait Facet<T: ?Sized> {
    fn matches(&self, item: &T) -> bool;
}

/// Items with free text a [`TextFacet`] can search.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Keep the items accepted by all `facets`. Never reorders.
pub fn apply<'a, T>(items: &'a [T], facets: &[&dyn Facet<T>]) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| facets.iter().all(|f| f.matches(item)))
        .collect()
}

/// Status chip on the zone-detail bay list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BayStatusFacet {
    #[default]
    All,
    Empty,
    /// New sessions without a warning.
    NewSession,
    Compliant,
    Overstay,
    /// Bays in violation and new sessions flagged with a warning.
    Violation,
}

impl Facet<Bay> for BayStatusFacet {
    fn matches(&self, bay: &Bay) -> bool {
        match self {
            BayStatusFacet::All => true,
            BayStatusFacet::Empty => bay.status() == BayStatus::Empty,
            BayStatusFacet::NewSession => {
                bay.status() == BayStatus::NewSession && !bay.has_warning()
            }
            BayStatusFacet::Compliant => bay.status() == BayStatus::Compliant,
            BayStatusFacet::Overstay => bay.status() == BayStatus::Overstay,
            BayStatusFacet::Violation => {
                bay.status() == BayStatus::Violation || bay.has_warning()
            }
        }
    }
}

/// Zone-equals facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneFacet(pub Option<String>);

impl Facet<Bay> for ZoneFacet {
    fn matches(&self, bay: &Bay) -> bool {
        self.0.as_deref().map_or(true, |zone| bay.zone_id == zone)
    }
}

/// Availability chip on the zone list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityFacet {
    #[default]
    All,
    Available,
    Full,
}

impl Facet<Zone> for AvailabilityFacet {
    fn matches(&self, zone: &Zone) -> bool {
        match self {
            AvailabilityFacet::All => true,
            AvailabilityFacet::Available => !zone.is_full(),
            AvailabilityFacet::Full => zone.is_full(),
        }
    }
}

/// Case-insensitive substring search. Blank text accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFacet(pub Option<String>);

impl TextFacet {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_lowercase()))
        }
    }
}

impl<T: Searchable> Facet<T> for TextFacet {
    fn matches(&self, item: &T) -> bool {
        let Some(needle) = self.0.as_deref() else {
            return true;
        };
        let needle = needle.to_lowercase();
        item.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Searchable for Zone {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(address) = &self.address {
            fields.push(address);
        }
        fields
    }
}

impl Searchable for Bay {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.number.as_str()];
        if let Some(plate) = self.registration() {
            fields.push(plate);
        }
        fields
    }
}

/// Facets for a bay list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BayFilter {
    #[serde(default)]
    pub status: BayStatusFacet,
    #[serde(default)]
    pub zone: ZoneFacet,
    #[serde(default)]
    pub text: TextFacet,
}

impl BayFilter {
    pub fn apply<'a>(&self, bays: &'a [Bay]) -> Vec<&'a Bay> {
        let facets: [&dyn Facet<Bay>; 3] = [&self.status, &self.zone, &self.text];
        apply(bays, &facets)
    }
}

/// Facets for the zone list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFilter {
    #[serde(default)]
    pub availability: AvailabilityFacet,
    #[serde(default)]
    pub text: TextFacet,
}

impl ZoneFilter {
    pub fn apply<'a>(&self, zones: &'a [Zone]) -> Vec<&'a Zone> {
        let facets: [&dyn Facet<Zone>; 2] = [&self.availability, &self.text];
        apply(zones, &facets)
    }
}

//! Base view selection and the process-wide navigation state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::filter::ZoneFilter;
use crate::obs;

use super::overlay::{Overlay, OverlayStack};

/// Bottom-tab views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseView {
    #[default]
    Map,
    List,
    Notifications,
    Account,
}

impl BaseView {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseView::Map => "map",
            BaseView::List => "list",
            BaseView::Notifications => "notifications",
            BaseView::Account => "account",
        }
    }
}

impl fmt::Display for BaseView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "map" => Ok(BaseView::Map),
            "list" => Ok(BaseView::List),
            "notifications" => Ok(BaseView::Notifications),
            "account" => Ok(BaseView::Account),
            other => Err(format!("unknown view: {other}")),
        }
    }
}

/// Where the operator is: one base view plus the overlays above it.
///
/// Starts on the map with no overlays. Filter selections survive view
/// switches; overlays never do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNavigationState {
    view: BaseView,
    overlays: OverlayStack,
    #[serde(default)]
    zone_filter: ZoneFilter,
}

impl AppNavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> BaseView {
        self.view
    }

    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayStack {
        &mut self.overlays
    }

    pub fn zone_filter(&self) -> &ZoneFilter {
        &self.zone_filter
    }

    pub fn set_zone_filter(&mut self, filter: ZoneFilter) {
        self.zone_filter = filter;
    }

    /// Select a base view. Always closes every overlay, even when the view
    /// does not change.
    pub fn switch_view(&mut self, view: BaseView) -> usize {
        let from = self.view;
        let discarded = self.overlays.pop_all();
        self.view = view;
        obs::emit_view_switched(from.as_str(), view.as_str(), discarded);
        discarded
    }

    pub fn push(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    /// Back navigation: close the visible overlay.
    pub fn back(&mut self) -> Option<Overlay> {
        self.overlays.pop()
    }

    /// Return to the base view with nothing open.
    pub fn reset(&mut self) {
        self.overlays.pop_all();
    }
}

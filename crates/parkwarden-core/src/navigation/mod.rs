//! Where the operator is.
//!
//! - **Base view**: map, list, notifications or account; switching closes
//!   every overlay.
//! - **Overlay stack**: search, scanner, menu, zone detail, lot detail,
//!   workflow and confirmation overlays, one per exclusive family.

pub mod error;
pub mod overlay;
pub mod state;

pub use error::{NavigationError, NavigationResult};
pub use overlay::{Overlay, OverlayFamily, OverlayKind, OverlayStack};
pub use state::{AppNavigationState, BaseView};

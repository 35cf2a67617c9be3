//! Parkwarden domain model.
//!
//! - **Bays**: one parking space and its lifecycle state.
//! - **Zones**: named groupings of bays, read-only for the console.
//! - **Records**: tickets and session changes produced by wizards.
//! - **Errors**: the console-wide error aggregate.

pub mod bay;
pub mod error;
pub mod ticket;
pub mod zone;

pub use bay::{normalize_registration, Bay, BayId, BaySnapshot, BayState, BayStatus};
pub use error::{ConsoleError, Result};
pub use ticket::{EnforcementRecord, SessionChange, Ticket, TicketDraft, TicketId, ViolationKind};
pub use zone::{Zone, ZoneSelected};

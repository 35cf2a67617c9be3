//! Bay enforcement lifecycle.
//!
//! - **Legal action table**: which operator actions each bay status allows,
//!   computed purely from status and the new-session warning flag.
//! - **Transitions**: applying an action yields a new bay or an
//!   `InvalidTransition` error; the original bay is never partially changed.
//! - **Ticket policy**: whether issuing a ticket moves the bay to
//!   `violation` is an integrator decision.

pub mod action;
pub mod book;
pub mod engine;
pub mod error;
pub mod policy;

pub use action::{ActionKind, ActionSet, LotAction};
pub use book::LotBook;
pub use engine::{after_ticket_issued, apply_action, ensure_legal, legal_actions, legal_actions_for};
pub use error::{LotResult, LotStatusError};
pub use policy::TicketPolicy;

//! Parkwarden Core Library
//!
//! Navigation and enforcement workflow state machines for an on-site
//! parking enforcement console: bay lifecycle rules, the overlay stack,
//! guided wizards with timed confirmations, and faceted filtering.

pub mod config;
pub mod console;
pub mod credential;
pub mod demo;
pub mod domain;
pub mod filter;
pub mod lot_status;
pub mod metrics;
pub mod navigation;
pub mod obs;
pub mod store;
pub mod telemetry;
pub mod wizard;

pub use config::{ConfigError, ConsoleConfig, DEFAULT_CONFIRMATION_MS};
pub use console::{
    ConsoleEvent, ConsoleOutcome, ConsoleSnapshot, EnforcementConsole, PriorPhoto, WizardSnapshot,
};
pub use credential::{
    CredentialError, CredentialGate, FormatTokenValidator, GateState, TokenValidator,
};
pub use domain::{
    normalize_registration, Bay, BayId, BaySnapshot, BayState, BayStatus, ConsoleError,
    EnforcementRecord, Result, SessionChange, Ticket, TicketDraft, TicketId, ViolationKind, Zone,
    ZoneSelected,
};
pub use filter::{
    AvailabilityFacet, BayFilter, BayStatusFacet, Facet, Searchable, TextFacet, ZoneFacet,
    ZoneFilter,
};
pub use lot_status::{
    apply_action, legal_actions, legal_actions_for, ActionKind, ActionSet, LotAction, LotBook,
    LotStatusError, TicketPolicy,
};
pub use navigation::{
    AppNavigationState, BaseView, NavigationError, Overlay, OverlayFamily, OverlayKind,
    OverlayStack,
};
pub use store::{EnforcementStore, FileEnforcementStore, MemoryEnforcementStore, StoreError};
pub use telemetry::init_tracing;
pub use wizard::{
    build_record, prefill_for, CaptureCategory, CaptureSlot, CaptureSlotStore, FieldKey, NextOutcome, PhotoHandle, SlotId,
    Submission, SubmitFailure, SubmitHandler, ValidationError, WizardDefinition, WizardEngine,
    WizardError, WizardKind, WizardPhase,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

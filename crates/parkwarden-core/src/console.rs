//! The enforcement console: one reducer over every operator event.
//!
//! [`EnforcementConsole`] owns the navigation state, the bay book, the
//! active wizard and the record store. Events are handled one at a time;
//! the only suspension points are token validation and submission, and
//! while a submission is pending the wizard refuses to submit again or
//! close.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ConsoleConfig;
use crate::credential::{CredentialGate, FormatTokenValidator, GateState, TokenValidator};
use crate::domain::bay::{normalize_registration, Bay, BayId, BaySnapshot};
use crate::domain::error::Result;
use crate::domain::ticket::{EnforcementRecord, SessionChange};
use crate::domain::zone::{Zone, ZoneSelected};
use crate::filter::{BayFilter, BayStatusFacet, ZoneFacet, ZoneFilter};
use crate::lot_status::{ActionKind, ActionSet, LotAction, LotBook};
use crate::metrics::METRICS;
use crate::navigation::{
    AppNavigationState, BaseView, NavigationError, Overlay, OverlayFamily, OverlayKind,
};
use crate::obs;
use crate::store::EnforcementStore;
use crate::wizard::{
    build_record, confirmation_message, definition_for, prefill_for, CaptureCategory, FieldKey,
    NextOutcome, PhotoHandle, SlotId, Submission, SubmitFailure, SubmitHandler, TimerToken,
    WizardEngine, WizardKind, WizardPhase,
};

/// A photo taken before the ticket wizard opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorPhoto {
    #[serde(default)]
    pub category: Option<CaptureCategory>,
    pub handle: PhotoHandle,
}

/// Operator and collaborator events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConsoleEvent {
    ProvideToken {
        token: String,
    },
    Lock,
    SwitchView {
        view: BaseView,
    },
    SetZoneFilter {
        filter: ZoneFilter,
    },
    OpenSearch,
    OpenScanner,
    OpenMenu,
    Back,
    ZoneSelected {
        zone: ZoneSelected,
    },
    SetBayStatusFilter {
        filter: BayStatusFacet,
    },
    SelectBay {
        bay_id: BayId,
    },
    /// Act on the bay shown by the lot-detail overlay.
    RequestAction {
        action: ActionKind,
    },
    /// "Issue ticket" on the past-violations overlay.
    IssueTicketFromHistory {
        #[serde(default)]
        prior_photos: Vec<PriorPhoto>,
    },
    SetField {
        field: FieldKey,
        value: String,
    },
    ClearField {
        field: FieldKey,
    },
    NextStep,
    PrevStep,
    Submit,
    CloseWizard,
    ScanCompleted {
        raw_value: String,
    },
    PhotoCaptured {
        #[serde(default)]
        category_hint: Option<CaptureCategory>,
        handle: PhotoHandle,
    },
    RemovePhoto {
        slot: SlotId,
    },
    /// A scheduled timer fired.
    Timer {
        token: TimerToken,
    },
    /// Let time pass; due timers fire.
    Tick,
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConsoleOutcome {
    Unlocked,
    Locked,
    Navigated { top: Option<OverlayKind> },
    BayUpdated { bay: BaySnapshot },
    WizardOpened { wizard: WizardKind },
    WizardStep { step: usize, total: usize },
    FieldUpdated { field: FieldKey },
    PhotoAttached { slot: SlotId },
    Submitted { record: EnforcementRecord },
    WizardClosed { wizard: WizardKind },
    Ignored,
}

#[derive(Debug)]
struct ActiveWizard {
    engine: WizardEngine,
    bay: BaySnapshot,
}

/// Serializable view of the console for inspection and replay output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleSnapshot {
    pub gate: GateState,
    pub view: BaseView,
    pub overlays: Vec<Overlay>,
    pub bays: Vec<Bay>,
    pub wizard: Option<WizardSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardSnapshot {
    pub kind: WizardKind,
    pub step: usize,
    pub total_steps: usize,
    pub phase: WizardPhase,
    pub fields: std::collections::BTreeMap<FieldKey, String>,
    pub photos: usize,
    pub last_error: Option<String>,
}

/// Persists a submission after checking the bay still allows it.
struct RecordSubmitter<'a, S: ?Sized> {
    bay: &'a BaySnapshot,
    book: &'a LotBook,
    store: &'a S,
    now: DateTime<Utc>,
}

#[async_trait]
impl<'a, S> SubmitHandler for RecordSubmitter<'a, S>
where
    S: EnforcementStore + ?Sized,
{
    async fn on_submit(
        &self,
        submission: &Submission,
    ) -> std::result::Result<EnforcementRecord, SubmitFailure> {
        let record = build_record(submission, self.bay, self.now)?;
        self.book
            .ensure_legal(record.bay_id(), action_kind_for(&record))
            .map_err(|e| SubmitFailure::Rejected(e.to_string()))?;
        self.store.record(&record).await?;
        Ok(record)
    }
}

fn action_kind_for(record: &EnforcementRecord) -> ActionKind {
    match record {
        EnforcementRecord::Ticket(_) => ActionKind::IssueTicket,
        EnforcementRecord::Session(SessionChange::Created { .. }) => ActionKind::AddSession,
        EnforcementRecord::Session(SessionChange::Edited { .. }) => ActionKind::EditSession,
    }
}

pub struct EnforcementConsole<S> {
    config: ConsoleConfig,
    gate: CredentialGate,
    validator: Box<dyn TokenValidator>,
    nav: AppNavigationState,
    book: LotBook,
    zones: Vec<Zone>,
    active: Option<ActiveWizard>,
    store: S,
}

impl<S: EnforcementStore> EnforcementConsole<S> {
    /// Create a locked console over `zones` and `book`.
    pub fn new(config: ConsoleConfig, zones: Vec<Zone>, book: LotBook, store: S) -> Self {
        Self {
            config,
            gate: CredentialGate::new(),
            validator: Box::new(FormatTokenValidator::default()),
            nav: AppNavigationState::new(),
            book,
            zones,
            active: None,
            store,
        }
    }

    pub fn with_validator(mut self, validator: impl TokenValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Try the configured access token. Without one the console stays on
    /// the token entry screen.
    pub async fn start(&mut self) -> Result<GateState> {
        if let Some(token) = self.config.access_token.clone() {
            self.gate.unlock(&token, &*self.validator).await?;
        }
        Ok(self.gate.state())
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    pub fn navigation(&self) -> &AppNavigationState {
        &self.nav
    }

    pub fn book(&self) -> &LotBook {
        &self.book
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn wizard(&self) -> Option<&WizardEngine> {
        self.active.as_ref().map(|a| &a.engine)
    }

    /// Zones on the list view after its filters.
    pub fn visible_zones(&self) -> Vec<&Zone> {
        self.nav.zone_filter().apply(&self.zones)
    }

    /// Bays listed by the open zone-detail overlay after its status chip.
    pub fn visible_bays(&self) -> Vec<&Bay> {
        match self.nav.overlays().find(OverlayFamily::Zone) {
            Some(Overlay::ZoneDetail {
                zone,
                status_filter,
            }) => BayFilter {
                status: *status_filter,
                zone: ZoneFacet(Some(zone.id.clone())),
                ..Default::default()
            }
            .apply(self.book.bays()),
            _ => Vec::new(),
        }
    }

    /// Actions to offer for the bay on the lot-detail overlay.
    pub fn offered_actions(&self) -> Result<ActionSet> {
        let bay = self.selected_bay()?;
        Ok(self.book.legal_actions(&bay.bay_id)?)
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        ConsoleSnapshot {
            gate: self.gate.state(),
            view: self.nav.view(),
            overlays: self.nav.overlays().iter().cloned().collect(),
            bays: self.book.bays().to_vec(),
            wizard: self.active.as_ref().map(|a| WizardSnapshot {
                kind: a.engine.kind(),
                step: a.engine.current_step(),
                total_steps: a.engine.total_steps(),
                phase: a.engine.phase(),
                fields: a.engine.fields().clone(),
                photos: a.engine.captures().len(),
                last_error: a.engine.last_error().map(ToString::to_string),
            }),
        }
    }

    pub async fn handle(
        &mut self,
        event: ConsoleEvent,
        now: DateTime<Utc>,
    ) -> Result<ConsoleOutcome> {
        match event {
            ConsoleEvent::ProvideToken { token } => {
                self.gate.unlock(&token, &*self.validator).await?;
                return Ok(ConsoleOutcome::Unlocked);
            }
            ConsoleEvent::Timer { token } => return Ok(self.on_timer(token)),
            ConsoleEvent::Tick => return Ok(self.on_tick(now)),
            _ if !self.gate.is_unlocked() => return Err(NavigationError::Locked.into()),
            _ => {}
        }

        match event {
            ConsoleEvent::Lock => {
                self.discard_wizard()?;
                self.nav.reset();
                self.gate.lock();
                Ok(ConsoleOutcome::Locked)
            }
            ConsoleEvent::SwitchView { view } => {
                self.discard_wizard()?;
                self.nav.switch_view(view);
                Ok(self.navigated())
            }
            ConsoleEvent::SetZoneFilter { filter } => {
                self.nav.set_zone_filter(filter);
                Ok(ConsoleOutcome::Ignored)
            }
            ConsoleEvent::OpenSearch => self.push_plain(Overlay::Search),
            ConsoleEvent::OpenScanner => self.push_plain(Overlay::Scanner),
            ConsoleEvent::OpenMenu => self.push_plain(Overlay::Menu),
            ConsoleEvent::Back => self.back(),
            ConsoleEvent::ZoneSelected { zone } => {
                if !self.zones.iter().any(|z| z.id == zone.id) {
                    return Err(NavigationError::UnknownZone(zone.id).into());
                }
                self.push_plain(Overlay::ZoneDetail {
                    zone,
                    status_filter: BayStatusFacet::All,
                })
            }
            ConsoleEvent::SetBayStatusFilter { filter } => {
                match self.nav.overlays_mut().find_mut(OverlayFamily::Zone) {
                    Some(Overlay::ZoneDetail { status_filter, .. }) => {
                        *status_filter = filter;
                        Ok(ConsoleOutcome::Ignored)
                    }
                    _ => Err(NavigationError::WrongOverlay {
                        expected: OverlayKind::ZoneDetail,
                    }
                    .into()),
                }
            }
            ConsoleEvent::SelectBay { bay_id } => {
                let bay = self.book.require(&bay_id)?.snapshot();
                self.push_plain(Overlay::LotDetail { bay })
            }
            ConsoleEvent::RequestAction { action } => self.request_action(action),
            ConsoleEvent::IssueTicketFromHistory { prior_photos } => {
                let bay = match self.nav.overlays().top() {
                    Some(Overlay::PastViolations { bay }) => bay.clone(),
                    _ => {
                        return Err(NavigationError::WrongOverlay {
                            expected: OverlayKind::PastViolations,
                        }
                        .into())
                    }
                };
                let seeds = prior_photos.into_iter().map(|p| (p.category, p.handle));
                self.open_wizard(WizardKind::IssueTicket, bay, seeds)
            }
            ConsoleEvent::SetField { field, value } => {
                let value = match field {
                    FieldKey::Registration => normalize_registration(&value).unwrap_or_default(),
                    _ => value,
                };
                self.engine_mut()?.set_field(field, &value)?;
                Ok(ConsoleOutcome::FieldUpdated { field })
            }
            ConsoleEvent::ClearField { field } => {
                self.engine_mut()?.clear_field(field)?;
                Ok(ConsoleOutcome::FieldUpdated { field })
            }
            ConsoleEvent::ScanCompleted { raw_value } => self.on_scan(&raw_value),
            ConsoleEvent::PhotoCaptured {
                category_hint,
                handle,
            } => {
                let slot = self.engine_mut()?.capture_photo(category_hint, handle)?;
                Ok(ConsoleOutcome::PhotoAttached { slot })
            }
            ConsoleEvent::RemovePhoto { slot } => {
                self.engine_mut()?.remove_capture(slot)?;
                Ok(ConsoleOutcome::Ignored)
            }
            ConsoleEvent::PrevStep => {
                let engine = self.engine_mut()?;
                let step = engine.back()?;
                Ok(ConsoleOutcome::WizardStep {
                    step,
                    total: engine.total_steps(),
                })
            }
            ConsoleEvent::NextStep => self.next_step(now).await,
            ConsoleEvent::Submit => self.submit(now).await,
            ConsoleEvent::CloseWizard => self.close_wizard(),
            ConsoleEvent::ProvideToken { .. } | ConsoleEvent::Timer { .. } | ConsoleEvent::Tick => {
                Ok(ConsoleOutcome::Ignored)
            }
        }
    }

    fn navigated(&self) -> ConsoleOutcome {
        ConsoleOutcome::Navigated {
            top: self.nav.overlays().top_kind(),
        }
    }

    /// Push a non-workflow overlay. A wizard whose overlay the push would
    /// close is discarded first.
    fn push_plain(&mut self, overlay: Overlay) -> Result<ConsoleOutcome> {
        if self.nav.overlays().evicts(&overlay, OverlayFamily::Workflow) {
            self.discard_wizard()?;
        }
        self.nav.push(overlay);
        Ok(self.navigated())
    }

    fn selected_bay(&self) -> Result<&BaySnapshot> {
        self.nav
            .overlays()
            .find(OverlayFamily::Lot)
            .and_then(Overlay::bay)
            .ok_or_else(|| NavigationError::NoSelection.into())
    }

    fn engine_mut(&mut self) -> Result<&mut WizardEngine> {
        self.active
            .as_mut()
            .map(|a| &mut a.engine)
            .ok_or_else(|| NavigationError::NoActiveWizard.into())
    }

    /// Actions are only taken from a visible lot-detail overlay.
    fn request_action(&mut self, action: ActionKind) -> Result<ConsoleOutcome> {
        let bay = match self.nav.overlays().top() {
            Some(Overlay::LotDetail { bay }) => bay.clone(),
            Some(_) => {
                return Err(NavigationError::WrongOverlay {
                    expected: OverlayKind::LotDetail,
                }
                .into())
            }
            None => return Err(NavigationError::NoSelection.into()),
        };
        self.book.ensure_legal(&bay.bay_id, action)?;
        match action {
            ActionKind::AddSession => self.open_wizard(WizardKind::NewSession, bay, Vec::new()),
            ActionKind::EditSession => self.open_wizard(WizardKind::EditSession, bay, Vec::new()),
            ActionKind::IssueTicket => {
                self.discard_wizard()?;
                self.nav.push(Overlay::PastViolations { bay });
                Ok(self.navigated())
            }
            ActionKind::ConfirmCompliance => {
                self.apply_direct(&bay.bay_id, LotAction::ConfirmCompliance)
            }
            ActionKind::EndSession => self.apply_direct(&bay.bay_id, LotAction::EndSession),
        }
    }

    fn apply_direct(&mut self, id: &BayId, action: LotAction) -> Result<ConsoleOutcome> {
        let bay = self.book.apply(id, &action)?.snapshot();
        self.nav.overlays_mut().refresh_bay(&bay);
        Ok(ConsoleOutcome::BayUpdated { bay })
    }

    fn open_wizard(
        &mut self,
        kind: WizardKind,
        bay: BaySnapshot,
        seeds: impl IntoIterator<Item = (Option<CaptureCategory>, PhotoHandle)>,
    ) -> Result<ConsoleOutcome> {
        self.discard_wizard()?;
        let engine = WizardEngine::new(definition_for(kind), self.config.confirmation())?
            .with_prefill(prefill_for(kind, &bay))
            .with_captures(seeds);
        info!(event = "wizard.opened", wizard = %kind, bay_id = %bay.bay_id);
        self.nav.push(Overlay::Wizard {
            wizard: kind,
            bay: bay.clone(),
        });
        self.active = Some(ActiveWizard { engine, bay });
        Ok(ConsoleOutcome::WizardOpened { wizard: kind })
    }

    fn ensure_not_submitting(&self) -> Result<()> {
        match &self.active {
            Some(a) if a.engine.phase() == WizardPhase::Submitting => {
                Err(NavigationError::WizardBusy.into())
            }
            _ => Ok(()),
        }
    }

    /// Close any open wizard. Refused while it is submitting.
    fn discard_wizard(&mut self) -> Result<()> {
        self.ensure_not_submitting()?;
        if let Some(mut active) = self.active.take() {
            active.engine.close()?;
            self.nav.overlays_mut().pop_through(OverlayFamily::Workflow);
        }
        Ok(())
    }

    fn close_wizard(&mut self) -> Result<ConsoleOutcome> {
        let kind = self
            .active
            .as_ref()
            .map(|a| a.engine.kind())
            .ok_or(NavigationError::NoActiveWizard)?;
        self.discard_wizard()?;
        Ok(ConsoleOutcome::WizardClosed { wizard: kind })
    }

    fn back(&mut self) -> Result<ConsoleOutcome> {
        match self.nav.overlays().top_kind() {
            Some(OverlayKind::Wizard | OverlayKind::Confirmation) if self.active.is_some() => {
                self.close_wizard()
            }
            _ => {
                self.nav.back();
                Ok(self.navigated())
            }
        }
    }

    fn on_scan(&mut self, raw: &str) -> Result<ConsoleOutcome> {
        if let Some(active) = self.active.as_mut() {
            let plate = normalize_registration(raw).unwrap_or_default();
            let field = active.engine.apply_scan(&plate)?;
            return Ok(ConsoleOutcome::FieldUpdated { field });
        }
        if self.nav.overlays().top_kind() != Some(OverlayKind::Scanner) {
            return Err(NavigationError::NoActiveWizard.into());
        }
        self.nav.back();
        let Some(plate) = normalize_registration(raw) else {
            return Ok(ConsoleOutcome::Ignored);
        };
        let found = self
            .book
            .bays()
            .iter()
            .find(|b| b.registration() == Some(plate.as_str()))
            .map(Bay::snapshot);
        match found {
            Some(bay) => self.push_plain(Overlay::LotDetail { bay }),
            None => Ok(ConsoleOutcome::Ignored),
        }
    }

    async fn next_step(&mut self, now: DateTime<Utc>) -> Result<ConsoleOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Err(NavigationError::NoActiveWizard.into());
        };
        match active.engine.next()? {
            NextOutcome::Advanced { step } => Ok(ConsoleOutcome::WizardStep {
                step,
                total: active.engine.total_steps(),
            }),
            NextOutcome::Submit(submission) => {
                let submitter = RecordSubmitter {
                    bay: &active.bay,
                    book: &self.book,
                    store: &self.store,
                    now,
                };
                let result = submitter.on_submit(&submission).await;
                let record = active.engine.complete_submit(result, now)?.clone();
                self.after_submit(record)
            }
        }
    }

    async fn submit(&mut self, now: DateTime<Utc>) -> Result<ConsoleOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Err(NavigationError::NoActiveWizard.into());
        };
        let submitter = RecordSubmitter {
            bay: &active.bay,
            book: &self.book,
            store: &self.store,
            now,
        };
        let record = active.engine.submit(&submitter, now).await?.clone();
        self.after_submit(record)
    }

    /// Apply a persisted record to the bay book and show the confirmation.
    fn after_submit(&mut self, record: EnforcementRecord) -> Result<ConsoleOutcome> {
        let id = record.bay_id().clone();
        let updated = match &record {
            EnforcementRecord::Ticket(_) => {
                self.book.apply_ticket(&id, self.config.ticket_policy)?
            }
            EnforcementRecord::Session(SessionChange::Created { registration, .. }) => {
                self.book.apply(
                    &id,
                    &LotAction::AddSession {
                        registration: registration.clone(),
                    },
                )?
            }
            EnforcementRecord::Session(SessionChange::Edited {
                registration,
                bay_number,
                zone_id,
                ..
            }) => self.book.apply(
                &id,
                &LotAction::EditSession {
                    registration: registration.clone(),
                    bay_number: bay_number.clone(),
                    zone_id: zone_id.clone(),
                },
            )?,
        };
        let snapshot = updated.snapshot();
        self.nav.overlays_mut().refresh_bay(&snapshot);
        if let Some(active) = self.active.as_mut() {
            active.bay = snapshot;
            self.nav.push(Overlay::Confirmation {
                wizard: active.engine.kind(),
                message: confirmation_message(&record),
            });
        }
        Ok(ConsoleOutcome::Submitted { record })
    }

    fn on_tick(&mut self, now: DateTime<Utc>) -> ConsoleOutcome {
        let closed = self
            .active
            .as_mut()
            .is_some_and(|a| a.engine.tick(now));
        if closed {
            self.finish_confirmation()
        } else {
            ConsoleOutcome::Ignored
        }
    }

    fn on_timer(&mut self, token: TimerToken) -> ConsoleOutcome {
        let Some(active) = self.active.as_mut() else {
            METRICS.inc_late_timers_ignored();
            obs::emit_late_timer_ignored(token.value());
            return ConsoleOutcome::Ignored;
        };
        if active.engine.fire(token) {
            self.finish_confirmation()
        } else {
            ConsoleOutcome::Ignored
        }
    }

    /// The confirmation timer elapsed: unwind to the base view.
    fn finish_confirmation(&mut self) -> ConsoleOutcome {
        let kind = self.active.take().map(|a| a.engine.kind());
        self.nav.reset();
        match kind {
            Some(wizard) => ConsoleOutcome::WizardClosed { wizard },
            None => ConsoleOutcome::Ignored,
        }
    }
}

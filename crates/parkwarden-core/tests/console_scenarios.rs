use chrono::{DateTime, Duration, TimeZone, Utc};

use parkwarden_core::demo::{demo_book, demo_zones};
use parkwarden_core::metrics::METRICS;
use parkwarden_core::store::EnforcementStore;
use parkwarden_core::{
    ActionKind, BayId, BaseView, BayStatus, ConsoleConfig, ConsoleError, ConsoleEvent,
    ConsoleOutcome, EnforcementConsole, EnforcementRecord, FieldKey, MemoryEnforcementStore,
    NavigationError, OverlayKind, PhotoHandle, TicketPolicy, WizardError, WizardPhase,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
}

fn at(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

async fn unlocked(config: ConsoleConfig) -> EnforcementConsole<MemoryEnforcementStore> {
    let mut console = EnforcementConsole::new(
        config.with_access_token("demo-token"),
        demo_zones(),
        demo_book(),
        MemoryEnforcementStore::new(),
    );
    console.start().await.expect("unlock");
    console
}

async fn send(
    console: &mut EnforcementConsole<MemoryEnforcementStore>,
    event: ConsoleEvent,
) -> ConsoleOutcome {
    console
        .handle(event, t0())
        .await
        .unwrap_or_else(|e| panic!("event failed: {e}"))
}

async fn open_lot(console: &mut EnforcementConsole<MemoryEnforcementStore>, id: &str) {
    send(
        console,
        ConsoleEvent::SelectBay {
            bay_id: BayId::new(id),
        },
    )
    .await;
}

async fn fill_new_session(console: &mut EnforcementConsole<MemoryEnforcementStore>, plate: &str) {
    open_lot(console, "b-201").await;
    send(
        console,
        ConsoleEvent::RequestAction {
            action: ActionKind::AddSession,
        },
    )
    .await;
    send(
        console,
        ConsoleEvent::SetField {
            field: FieldKey::Registration,
            value: plate.into(),
        },
    )
    .await;
    send(console, ConsoleEvent::NextStep).await;
    send(console, ConsoleEvent::NextStep).await;
}

fn status_of(console: &EnforcementConsole<MemoryEnforcementStore>, id: &str) -> BayStatus {
    console
        .book()
        .get(&BayId::new(id))
        .map(|b| b.status())
        .expect("bay")
}

// ---------------------------------------------------------------------------
// New session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_session_on_empty_bay() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "xyz-111").await;

    let outcome = send(&mut console, ConsoleEvent::Submit).await;
    assert!(matches!(outcome, ConsoleOutcome::Submitted { .. }));

    let bay = console.book().get(&BayId::new("b-201")).expect("bay");
    assert_eq!(bay.status(), BayStatus::NewSession);
    assert_eq!(bay.registration(), Some("XYZ-111"));
    assert!(!bay.has_warning());

    assert_eq!(
        console.navigation().overlays().top_kind(),
        Some(OverlayKind::Confirmation)
    );
    let records = console.store().records().await.expect("records");
    assert_eq!(records.len(), 1);
    assert!(matches!(records[0], EnforcementRecord::Session(_)));

    // Lot detail shown under the wizard reflects the new session.
    let lot = console
        .navigation()
        .overlays()
        .iter()
        .find(|o| o.kind() == OverlayKind::LotDetail)
        .and_then(|o| o.bay())
        .expect("lot detail");
    assert_eq!(lot.status, BayStatus::NewSession);
}

#[tokio::test]
async fn confirmation_closes_after_timeout() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "XYZ-111").await;
    send(&mut console, ConsoleEvent::Submit).await;

    let early = console.handle(ConsoleEvent::Tick, at(2000)).await.expect("tick");
    assert_eq!(early, ConsoleOutcome::Ignored);
    assert!(console.wizard().is_some());

    let closed = console.handle(ConsoleEvent::Tick, at(2500)).await.expect("tick");
    assert!(matches!(closed, ConsoleOutcome::WizardClosed { .. }));
    assert!(console.wizard().is_none());
    assert!(console.navigation().overlays().is_empty());
}

#[tokio::test]
async fn late_timer_after_manual_close_is_ignored() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "XYZ-111").await;
    send(&mut console, ConsoleEvent::Submit).await;
    let token = console
        .wizard()
        .and_then(|w| w.pending_timer())
        .map(|t| t.token())
        .expect("timer");

    send(&mut console, ConsoleEvent::CloseWizard).await;
    let before = METRICS.late_timers_ignored();
    let outcome = send(&mut console, ConsoleEvent::Timer { token }).await;
    assert_eq!(outcome, ConsoleOutcome::Ignored);
    assert!(METRICS.late_timers_ignored() > before);
    assert_eq!(status_of(&console, "b-201"), BayStatus::NewSession);
}

#[tokio::test]
async fn store_failure_keeps_wizard_editing() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "XYZ-111").await;
    console.store().fail_next("network down");

    let err = console
        .handle(ConsoleEvent::Submit, t0())
        .await
        .expect_err("store offline");
    assert!(matches!(
        err,
        ConsoleError::Wizard(WizardError::SubmitFailed(_))
    ));

    let wizard = console.wizard().expect("still open");
    assert_eq!(wizard.phase(), WizardPhase::Editing);
    assert_eq!(wizard.field(FieldKey::Registration), Some("XYZ-111"));
    assert!(wizard.last_error().is_some());
    assert_eq!(status_of(&console, "b-201"), BayStatus::Empty);

    // Retry succeeds once the store is back.
    let outcome = send(&mut console, ConsoleEvent::Submit).await;
    assert!(matches!(outcome, ConsoleOutcome::Submitted { .. }));
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ticket_from_history_with_prior_photo() {
    let config = ConsoleConfig::default().with_ticket_policy(TicketPolicy::MarkViolation);
    let mut console = unlocked(config).await;
    open_lot(&mut console, "b-034").await;
    send(
        &mut console,
        ConsoleEvent::RequestAction {
            action: ActionKind::IssueTicket,
        },
    )
    .await;
    assert_eq!(
        console.navigation().overlays().top_kind(),
        Some(OverlayKind::PastViolations)
    );

    send(
        &mut console,
        ConsoleEvent::IssueTicketFromHistory {
            prior_photos: vec![parkwarden_core::PriorPhoto {
                category: Some(parkwarden_core::CaptureCategory::License),
                handle: PhotoHandle::new("photo://prior"),
            }],
        },
    )
    .await;
    assert_eq!(
        console.navigation().overlays().top_kind(),
        Some(OverlayKind::Wizard)
    );

    send(&mut console, ConsoleEvent::NextStep).await;
    send(&mut console, ConsoleEvent::NextStep).await;
    send(
        &mut console,
        ConsoleEvent::SetField {
            field: FieldKey::ViolationKind,
            value: "overstay".into(),
        },
    )
    .await;
    send(&mut console, ConsoleEvent::NextStep).await;

    let outcome = send(&mut console, ConsoleEvent::Submit).await;
    let ConsoleOutcome::Submitted {
        record: EnforcementRecord::Ticket(ticket),
    } = outcome
    else {
        panic!("expected a ticket");
    };
    assert_eq!(ticket.registration(), "DEF-456");
    assert_eq!(ticket.photos().len(), 1);
    assert_eq!(status_of(&console, "b-034"), BayStatus::Violation);
}

#[tokio::test]
async fn illegal_request_leaves_bay_untouched() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    open_lot(&mut console, "b-129").await;
    let err = console
        .handle(
            ConsoleEvent::RequestAction {
                action: ActionKind::AddSession,
            },
            t0(),
        )
        .await
        .expect_err("compliant bay cannot add a session");
    assert!(matches!(err, ConsoleError::LotStatus(_)));
    assert_eq!(status_of(&console, "b-129"), BayStatus::Compliant);
    assert!(console.wizard().is_none());
}

// ---------------------------------------------------------------------------
// Navigation through the console
// ---------------------------------------------------------------------------

#[tokio::test]
async fn switching_tabs_discards_open_wizard() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "XYZ-111").await;
    send(
        &mut console,
        ConsoleEvent::SwitchView {
            view: BaseView::List,
        },
    )
    .await;

    assert!(console.wizard().is_none());
    assert!(console.navigation().overlays().is_empty());
    assert_eq!(console.navigation().view(), BaseView::List);
    assert_eq!(status_of(&console, "b-201"), BayStatus::Empty);
}

#[tokio::test]
async fn opening_another_bay_discards_editing_wizard() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "XYZ-111").await;
    open_lot(&mut console, "b-042").await;

    assert!(console.wizard().is_none());
    let top = console.navigation().overlays().top().expect("overlay");
    assert_eq!(top.bay().map(|b| b.bay_number.as_str()), Some("B-042"));
    assert_eq!(console.navigation().overlays().len(), 1);

    let err = console
        .handle(
            ConsoleEvent::SetField {
                field: FieldKey::Registration,
                value: "QQQ-000".into(),
            },
            t0(),
        )
        .await
        .expect_err("no wizard");
    assert!(matches!(
        err,
        ConsoleError::Navigation(NavigationError::NoActiveWizard)
    ));
    assert_eq!(status_of(&console, "b-201"), BayStatus::Empty);
}

#[tokio::test]
async fn confirmation_timer_spares_newly_opened_bay() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    fill_new_session(&mut console, "XYZ-111").await;
    send(&mut console, ConsoleEvent::Submit).await;
    let token = console
        .wizard()
        .and_then(|w| w.pending_timer())
        .map(|t| t.token())
        .expect("timer");

    open_lot(&mut console, "b-042").await;
    assert!(console.wizard().is_none());

    let ticked = console.handle(ConsoleEvent::Tick, at(2500)).await.expect("tick");
    assert_eq!(ticked, ConsoleOutcome::Ignored);
    let late = send(&mut console, ConsoleEvent::Timer { token }).await;
    assert_eq!(late, ConsoleOutcome::Ignored);

    assert_eq!(
        console.navigation().overlays().top_kind(),
        Some(OverlayKind::LotDetail)
    );
    assert_eq!(status_of(&console, "b-201"), BayStatus::NewSession);
}

#[tokio::test]
async fn lot_actions_refused_under_open_wizard() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    open_lot(&mut console, "b-042").await;
    send(
        &mut console,
        ConsoleEvent::RequestAction {
            action: ActionKind::EditSession,
        },
    )
    .await;

    for action in [ActionKind::ConfirmCompliance, ActionKind::EndSession] {
        let err = console
            .handle(ConsoleEvent::RequestAction { action }, t0())
            .await
            .expect_err("wizard is on top");
        assert!(matches!(
            err,
            ConsoleError::Navigation(NavigationError::WrongOverlay {
                expected: OverlayKind::LotDetail
            })
        ));
    }

    assert_eq!(status_of(&console, "b-042"), BayStatus::NewSession);
    assert_eq!(
        console.navigation().overlays().top_kind(),
        Some(OverlayKind::Wizard)
    );
    let wizard = console.wizard().expect("still open");
    assert_eq!(wizard.kind(), parkwarden_core::WizardKind::EditSession);
    assert_eq!(wizard.field(FieldKey::Registration), Some("ABC-123"));
}

#[tokio::test]
async fn scanner_result_opens_matching_bay() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    send(&mut console, ConsoleEvent::OpenScanner).await;
    send(
        &mut console,
        ConsoleEvent::ScanCompleted {
            raw_value: " def-456 ".into(),
        },
    )
    .await;

    let top = console.navigation().overlays().top().expect("overlay");
    assert_eq!(top.kind(), OverlayKind::LotDetail);
    assert_eq!(top.bay().map(|b| b.bay_number.as_str()), Some("B-034"));
    assert_eq!(console.navigation().overlays().len(), 1);
}

#[tokio::test]
async fn locked_console_refuses_navigation() {
    let mut console = EnforcementConsole::new(
        ConsoleConfig::default(),
        demo_zones(),
        demo_book(),
        MemoryEnforcementStore::new(),
    );
    let err = console
        .handle(ConsoleEvent::OpenMenu, t0())
        .await
        .expect_err("locked");
    assert!(matches!(
        err,
        ConsoleError::Navigation(NavigationError::Locked)
    ));

    let outcome = console
        .handle(
            ConsoleEvent::ProvideToken {
                token: "operator-7".into(),
            },
            t0(),
        )
        .await
        .expect("unlock");
    assert_eq!(outcome, ConsoleOutcome::Unlocked);
    send(&mut console, ConsoleEvent::OpenMenu).await;
}

#[tokio::test]
async fn zone_status_chip_filters_bay_list() {
    let mut console = unlocked(ConsoleConfig::default()).await;
    let zone = demo_zones()
        .into_iter()
        .find(|z| z.id == "zone-b")
        .expect("zone b")
        .selected();
    send(&mut console, ConsoleEvent::ZoneSelected { zone }).await;
    assert_eq!(console.visible_bays().len(), console.book().bays().len());

    send(
        &mut console,
        ConsoleEvent::SetBayStatusFilter {
            filter: parkwarden_core::BayStatusFacet::Empty,
        },
    )
    .await;
    let numbers: Vec<&str> = console
        .visible_bays()
        .iter()
        .map(|b| b.number.as_str())
        .collect();
    assert_eq!(numbers, vec!["B-155", "B-167", "B-201"]);
}

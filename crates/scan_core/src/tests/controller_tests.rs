use std::collections::BTreeMap;

use shared::error::ErrorCode;

use super::*;
use crate::state::{INVALID_CODE_ALERT, NOT_FOUND_ALERT};

fn record(id: u64, name: &str) -> ItemRecord {
    ItemRecord {
        id: ItemId(id),
        name: name.to_string(),
        thumbnail: None,
        extensions: BTreeMap::new(),
    }
}

fn start_cycle(controller: &mut LookupController, payload: &str) -> LookupTicket {
    let decision = controller.handle_scan(&DecodedCode::qr(payload));
    let AdmissionDecision::Accept(item_id) = decision else {
        panic!("expected {payload:?} to be accepted, got {decision:?}");
    };
    controller.begin_lookup(item_id).expect("begin lookup")
}

#[test]
fn resolves_with_first_record() {
    let mut controller = LookupController::new();
    let ticket = start_cycle(&mut controller, "1024");
    assert_eq!(controller.state(), CycleState::Loading(ItemId(1024)));

    let state = controller
        .complete_lookup(
            ticket,
            Ok(vec![record(1024, "Widget"), record(1024, "Shadowed")]),
        )
        .expect("complete");

    assert_eq!(state, CycleState::Resolved(ItemId(1024)));
    assert_eq!(controller.item().map(|item| item.name.as_str()), Some("Widget"));
    assert!(controller.alert().is_none());
}

#[test]
fn empty_result_is_not_found_with_alert() {
    let mut controller = LookupController::new();
    let ticket = start_cycle(&mut controller, "9999");

    let state = controller.complete_lookup(ticket, Ok(Vec::new())).expect("complete");

    assert_eq!(state, CycleState::NotFound(ItemId(9999)));
    assert!(controller.item().is_none());
    let alert = controller.alert().expect("alert");
    assert_eq!(alert.text, NOT_FOUND_ALERT);
    assert_eq!(alert.code, ErrorCode::EmptyResult);
}

#[test]
fn invalid_payload_raises_alert_and_stays_idle() {
    let mut controller = LookupController::new();

    let decision = controller.handle_scan(&DecodedCode::qr("abc"));

    assert_eq!(
        decision,
        AdmissionDecision::Reject(RejectReason::InvalidPayload)
    );
    assert_eq!(controller.state(), CycleState::Idle);
    assert_eq!(
        controller.alert().map(|alert| alert.text.as_str()),
        Some(INVALID_CODE_ALERT)
    );
}

#[test]
fn lookup_error_fails_cycle_with_status_text() {
    let mut controller = LookupController::new();
    let ticket = start_cycle(&mut controller, "5");

    let state = controller
        .complete_lookup(
            ticket,
            Err(LookupError::Status {
                status: 500,
                body: "database offline".into(),
            }),
        )
        .expect("complete");

    assert_eq!(state, CycleState::Failed(ItemId(5)));
    assert!(controller.item().is_none());
    let alert = controller.alert().expect("alert");
    assert_eq!(alert.code, ErrorCode::TransportError);
    assert!(alert.text.contains("500"), "alert: {}", alert.text);
    assert!(alert.text.contains("database offline"), "alert: {}", alert.text);
}

#[test]
fn scans_while_loading_are_dropped_silently() {
    let mut controller = LookupController::new();
    let ticket = start_cycle(&mut controller, "20");

    for payload in ["10", "20", "abc"] {
        assert_eq!(
            controller.handle_scan(&DecodedCode::qr(payload)),
            AdmissionDecision::Reject(RejectReason::AlreadyLocked)
        );
    }
    assert!(controller.alert().is_none());

    controller
        .complete_lookup(ticket, Ok(vec![record(20, "Twenty")]))
        .expect("complete");
    assert_eq!(controller.state(), CycleState::Resolved(ItemId(20)));
    assert_eq!(controller.item().map(|item| item.id), Some(ItemId(20)));
}

#[test]
fn begin_lookup_refuses_reentry_and_foreign_ids() {
    let mut controller = LookupController::new();
    assert!(matches!(
        controller.begin_lookup(ItemId(1)),
        Err(ControllerError::InvalidTransition {
            state: CycleState::Idle,
            ..
        })
    ));

    controller.handle_scan(&DecodedCode::qr("1"));
    assert!(controller.begin_lookup(ItemId(2)).is_err());
    controller.begin_lookup(ItemId(1)).expect("begin");

    assert_eq!(
        controller.begin_lookup(ItemId(1)),
        Err(ControllerError::InvalidTransition {
            action: "begin lookup",
            state: CycleState::Loading(ItemId(1)),
        })
    );
}

#[test]
fn accepted_scan_goes_straight_to_loading_with_its_ticket() {
    let mut controller = LookupController::new();

    let (decision, ticket) = controller.scan_and_begin(&DecodedCode::qr("abc"));
    assert_eq!(decision, AdmissionDecision::Reject(RejectReason::InvalidPayload));
    assert!(ticket.is_none());
    assert_eq!(controller.state(), CycleState::Idle);

    let (decision, ticket) = controller.scan_and_begin(&DecodedCode::qr("42"));
    assert_eq!(decision, AdmissionDecision::Accept(ItemId(42)));
    let ticket = ticket.expect("accepted scan carries a ticket");
    assert_eq!(ticket.item_id(), ItemId(42));
    assert_eq!(controller.state(), CycleState::Loading(ItemId(42)));

    let (decision, ticket) = controller.scan_and_begin(&DecodedCode::qr("43"));
    assert_eq!(decision, AdmissionDecision::Reject(RejectReason::AlreadyLocked));
    assert!(ticket.is_none());
    assert_eq!(controller.state(), CycleState::Loading(ItemId(42)));
}

#[test]
fn reset_is_refused_while_in_flight() {
    let mut controller = LookupController::new();
    controller.handle_scan(&DecodedCode::qr("7"));
    assert!(controller.reset().is_err());

    let ticket = controller.begin_lookup(ItemId(7)).expect("begin");
    let err = controller.reset().expect_err("reset while loading");
    assert_eq!(err.to_string(), "cannot reset while loading");
    assert_eq!(controller.state(), CycleState::Loading(ItemId(7)));

    controller
        .complete_lookup(ticket, Ok(vec![record(7, "Seven")]))
        .expect("complete");
}

#[test]
fn reset_is_idempotent_from_terminal_state() {
    let mut controller = LookupController::new();
    let ticket = start_cycle(&mut controller, "9999");
    controller.complete_lookup(ticket, Ok(Vec::new())).expect("complete");

    controller.reset().expect("first reset");
    let once = controller.snapshot();
    controller.reset().expect("second reset");

    assert_eq!(controller.snapshot(), once);
    assert_eq!(once.state, CycleState::Idle);
    assert!(once.item.is_none());
    assert!(once.alert.is_none());
}

#[test]
fn stale_ticket_cannot_touch_a_later_cycle() {
    let mut controller = LookupController::new();
    let first = start_cycle(&mut controller, "1");
    controller
        .complete_lookup(first, Ok(vec![record(1, "One")]))
        .expect("complete first");
    controller.reset().expect("reset");

    let second = start_cycle(&mut controller, "2");
    assert_eq!(
        controller.complete_lookup(first, Ok(vec![record(1, "One again")])),
        Err(ControllerError::StaleCompletion { ticket_cycle: 1 })
    );
    assert_eq!(controller.state(), CycleState::Loading(ItemId(2)));

    controller.complete_lookup(second, Ok(Vec::new())).expect("complete second");
    assert_eq!(
        controller.complete_lookup(second, Ok(Vec::new())),
        Err(ControllerError::InvalidTransition {
            action: "complete lookup",
            state: CycleState::NotFound(ItemId(2)),
        })
    );
}

#[test]
fn dismissing_alert_keeps_cycle_state() {
    let mut controller = LookupController::new();
    let ticket = start_cycle(&mut controller, "3");
    controller
        .complete_lookup(ticket, Err(LookupError::Transport("connection refused".into())))
        .expect("complete");

    assert!(controller.dismiss_alert());
    assert!(!controller.dismiss_alert());
    assert_eq!(controller.state(), CycleState::Failed(ItemId(3)));
    assert_eq!(
        controller.handle_scan(&DecodedCode::qr("4")),
        AdmissionDecision::Reject(RejectReason::AlreadyLocked)
    );
}

#[test]
fn accepting_a_new_scan_clears_previous_alert() {
    let mut controller = LookupController::new();
    controller.handle_scan(&DecodedCode::qr("not-a-number"));
    assert!(controller.alert().is_some());

    controller.handle_scan(&DecodedCode::qr("12"));
    assert_eq!(controller.state(), CycleState::Locked(ItemId(12)));
    assert!(controller.alert().is_none());
}

use shared::domain::{PurchasedItem, ReceiptUpload, RecallMatch, SessionId};

use super::*;

fn upload(name: &str) -> ReceiptUpload {
    ReceiptUpload::new(name, Some("image/jpeg".into()), b"img".to_vec()).expect("upload")
}

fn session_id(raw: &str) -> SessionId {
    SessionId::new(raw).expect("session id")
}

fn milk() -> PurchasedItem {
    PurchasedItem::new("2% Milk 1L")
}

fn milk_recall() -> RecallMatch {
    RecallMatch {
        purchased_item_name: "2% Milk 1L".into(),
        recall_id: "R-123".into(),
        recall_title: "Milk recall".into(),
        reason: "listeria".into(),
    }
}

fn apply(state: &WorkflowState, event: WorkflowEvent) -> WorkflowState {
    reduce(state, event).expect("transition").0
}

fn ready_state() -> WorkflowState {
    let selected = apply(
        &WorkflowState::default(),
        WorkflowEvent::FileSelected(upload("milk.jpg")),
    );
    let uploading = apply(&selected, WorkflowEvent::UploadRequested);
    apply(
        &uploading,
        WorkflowEvent::UploadCompleted(UploadOutcome::Extracted {
            session_id: session_id("s-1"),
            items: vec![milk()],
        }),
    )
}

#[test]
fn upload_request_moves_file_into_effect() {
    let selected = apply(
        &WorkflowState::default(),
        WorkflowEvent::FileSelected(upload("milk.jpg")),
    );
    assert_eq!(selected.status, FlowStatus::Idle);

    let (next, effect) = reduce(&selected, WorkflowEvent::UploadRequested).expect("upload");
    assert_eq!(next.status, FlowStatus::Uploading);
    assert!(next.selected_file.is_none());
    assert_eq!(effect, Effect::Upload(upload("milk.jpg")));
}

#[test]
fn upload_without_file_is_rejected() {
    let err = reduce(&WorkflowState::default(), WorkflowEvent::UploadRequested)
        .expect_err("must reject");
    assert_eq!(err, WorkflowError::NoFileSelected);
}

#[test]
fn extraction_failure_keeps_partial_items() {
    let uploading = WorkflowState {
        status: FlowStatus::Uploading,
        ..WorkflowState::default()
    };
    let next = apply(
        &uploading,
        WorkflowEvent::UploadCompleted(UploadOutcome::ExtractionFailed {
            session_id: session_id("s-2"),
            items: vec![milk()],
            message: "Could not read the receipt text: blurry".into(),
        }),
    );

    assert_eq!(next.status, FlowStatus::Error);
    assert_eq!(next.purchased_items, vec![milk()]);
    assert_eq!(next.session_id, None);
    assert_eq!(
        next.error.as_ref().map(|e| e.kind),
        Some(FailureKind::Extraction)
    );
}

#[test]
fn no_items_is_a_user_correctable_error() {
    let processing = WorkflowState {
        status: FlowStatus::Processing,
        ..WorkflowState::default()
    };
    let next = apply(
        &processing,
        WorkflowEvent::UploadCompleted(UploadOutcome::NoItems {
            session_id: session_id("s-3"),
        }),
    );

    assert_eq!(next.status, FlowStatus::Error);
    assert_eq!(next.session_id, None);
    assert_eq!(next.error_message(), Some(NO_ITEMS_MESSAGE));
    assert_eq!(next.error.map(|e| e.kind), Some(FailureKind::NoItems));
}

#[test]
fn transport_failure_restores_file_for_retry() {
    let uploading = WorkflowState {
        status: FlowStatus::Uploading,
        ..WorkflowState::default()
    };
    let next = apply(
        &uploading,
        WorkflowEvent::UploadFailed {
            upload: upload("milk.jpg"),
            message: "Failed to upload receipt: Bad Gateway".into(),
        },
    );

    assert_eq!(next.status, FlowStatus::Error);
    assert!(next.can_submit());
    assert!(!next.can_check_recalls());
}

#[test]
fn recall_check_requires_ready_session() {
    let err = reduce(&WorkflowState::default(), WorkflowEvent::RecallCheckRequested)
        .expect_err("must reject");
    assert_eq!(
        err,
        WorkflowError::NotReady {
            status: FlowStatus::Idle
        }
    );

    let (checking, effect) =
        reduce(&ready_state(), WorkflowEvent::RecallCheckRequested).expect("check");
    assert_eq!(checking.status, FlowStatus::Checking);
    assert_eq!(effect, Effect::CheckRecalls(session_id("s-1")));
}

#[test]
fn matching_failure_keeps_known_items_and_allows_retry() {
    let checking = apply(&ready_state(), WorkflowEvent::RecallCheckRequested);
    let failed = apply(
        &checking,
        WorkflowEvent::RecallCheckCompleted(RecallOutcome::MatchingFailed {
            items: None,
            matches: None,
            message: "Recall matching failed: overloaded".into(),
        }),
    );

    assert_eq!(failed.status, FlowStatus::Error);
    assert_eq!(failed.purchased_items, vec![milk()]);
    assert_eq!(failed.session_id, Some(session_id("s-1")));
    assert!(failed.can_check_recalls());

    let retry = apply(&failed, WorkflowEvent::RecallCheckRequested);
    assert_eq!(retry.status, FlowStatus::Checking);
    assert_eq!(retry.error, None);
}

#[test]
fn completed_check_replaces_items_and_matches() {
    let checking = apply(&ready_state(), WorkflowEvent::RecallCheckRequested);
    let done = apply(
        &checking,
        WorkflowEvent::RecallCheckCompleted(RecallOutcome::Checked {
            items: Some(vec![milk(), PurchasedItem::new("Bread")]),
            matches: vec![milk_recall()],
        }),
    );

    assert_eq!(done.status, FlowStatus::Done);
    assert_eq!(done.purchased_items.len(), 2);
    assert_eq!(done.recall_matches, Some(vec![milk_recall()]));
}

#[test]
fn selecting_a_file_is_rejected_while_checking() {
    let checking = apply(&ready_state(), WorkflowEvent::RecallCheckRequested);
    let err = reduce(&checking, WorkflowEvent::FileSelected(upload("bread.jpg")))
        .expect_err("must reject");
    assert_eq!(
        err,
        WorkflowError::Busy {
            status: FlowStatus::Checking
        }
    );
}

#[test]
fn responses_outside_their_phase_are_rejected() {
    let err = reduce(
        &ready_state(),
        WorkflowEvent::RecallCheckFailed {
            message: "late".into(),
        },
    )
    .expect_err("must reject");
    assert!(matches!(err, WorkflowError::UnexpectedEvent { .. }));
}

fn event_alphabet() -> Vec<WorkflowEvent> {
    vec![
        WorkflowEvent::FileSelected(upload("milk.jpg")),
        WorkflowEvent::UploadRequested,
        WorkflowEvent::UploadProcessing,
        WorkflowEvent::UploadCompleted(UploadOutcome::Extracted {
            session_id: session_id("s-1"),
            items: vec![milk()],
        }),
        WorkflowEvent::UploadCompleted(UploadOutcome::ExtractionFailed {
            session_id: session_id("s-1"),
            items: vec![milk()],
            message: "ocr".into(),
        }),
        WorkflowEvent::UploadCompleted(UploadOutcome::NoItems {
            session_id: session_id("s-1"),
        }),
        WorkflowEvent::UploadFailed {
            upload: upload("milk.jpg"),
            message: "offline".into(),
        },
        WorkflowEvent::RecallCheckRequested,
        WorkflowEvent::RecallCheckCompleted(RecallOutcome::Checked {
            items: Some(Vec::new()),
            matches: vec![milk_recall()],
        }),
        WorkflowEvent::RecallCheckCompleted(RecallOutcome::MatchingFailed {
            items: None,
            matches: Some(vec![milk_recall()]),
            message: "llm".into(),
        }),
        WorkflowEvent::RecallCheckFailed {
            message: "offline".into(),
        },
        WorkflowEvent::Reset,
    ]
}

fn allowed(from: FlowStatus, to: FlowStatus) -> bool {
    use FlowStatus::*;
    from == to
        || to == Idle
        || matches!(
            (from, to),
            (Idle | Ready | Done | Error, Uploading)
                | (Uploading, Processing)
                | (Uploading | Processing, Ready | Error)
                | (Ready | Error, Checking)
                | (Checking, Done | Error)
        )
}

fn explore(state: &WorkflowState, depth: usize, alphabet: &[WorkflowEvent], visited: &mut usize) {
    if depth == 0 {
        return;
    }
    for event in alphabet {
        let Ok((next, _)) = reduce(state, event.clone()) else {
            continue;
        };
        *visited += 1;
        assert!(
            allowed(state.status, next.status),
            "illegal transition {} -> {} via {}",
            state.status,
            next.status,
            event.name()
        );
        if let Some(problem) = next.inconsistency() {
            panic!("{problem}: reached via {} from {state:?}", event.name());
        }
        if *event == WorkflowEvent::Reset {
            assert_eq!(next, WorkflowState::default());
        }
        explore(&next, depth - 1, alphabet, visited);
    }
}

#[test]
fn every_event_sequence_follows_the_transition_table() {
    let alphabet = event_alphabet();
    let mut visited = 0;
    explore(&WorkflowState::default(), 6, &alphabet, &mut visited);
    assert!(visited > 100, "explored only {visited} transitions");
}

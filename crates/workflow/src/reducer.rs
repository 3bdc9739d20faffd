//! Pure transition function over [`WorkflowState`].

use crate::{
    error::WorkflowError,
    events::{Effect, RecallOutcome, UploadOutcome, WorkflowEvent, NO_ITEMS_MESSAGE},
    state::{FailureKind, FlowStatus, WorkflowFailure, WorkflowState},
};

pub fn reduce(
    state: &WorkflowState,
    event: WorkflowEvent,
) -> Result<(WorkflowState, Effect), WorkflowError> {
    let status = state.status;
    let event_name = event.name();
    let unexpected = || WorkflowError::UnexpectedEvent {
        event: event_name,
        status,
    };

    match event {
        WorkflowEvent::Reset => Ok((WorkflowState::default(), Effect::None)),

        WorkflowEvent::FileSelected(file) => {
            if status.is_in_flight() {
                return Err(WorkflowError::Busy { status });
            }
            let next = WorkflowState {
                selected_file: Some(file),
                ..WorkflowState::default()
            };
            Ok((next, Effect::None))
        }

        WorkflowEvent::UploadRequested => {
            if status.is_in_flight() {
                return Err(WorkflowError::Busy { status });
            }
            let file = state
                .selected_file
                .clone()
                .ok_or(WorkflowError::NoFileSelected)?;
            let next = WorkflowState {
                status: FlowStatus::Uploading,
                ..WorkflowState::default()
            };
            Ok((next, Effect::Upload(file)))
        }

        WorkflowEvent::UploadProcessing => match status {
            FlowStatus::Uploading => Ok((
                WorkflowState {
                    status: FlowStatus::Processing,
                    ..state.clone()
                },
                Effect::None,
            )),
            _ => Err(unexpected()),
        },

        WorkflowEvent::UploadCompleted(outcome) => {
            if !matches!(status, FlowStatus::Uploading | FlowStatus::Processing) {
                return Err(unexpected());
            }
            let next = match outcome {
                UploadOutcome::Extracted { session_id, items } => WorkflowState {
                    status: FlowStatus::Ready,
                    session_id: Some(session_id),
                    purchased_items: items,
                    ..WorkflowState::default()
                },
                UploadOutcome::ExtractionFailed { items, message, .. } => WorkflowState {
                    status: FlowStatus::Error,
                    purchased_items: items,
                    error: Some(WorkflowFailure::new(FailureKind::Extraction, message)),
                    ..WorkflowState::default()
                },
                UploadOutcome::NoItems { .. } => WorkflowState {
                    status: FlowStatus::Error,
                    error: Some(WorkflowFailure::new(
                        FailureKind::NoItems,
                        NO_ITEMS_MESSAGE,
                    )),
                    ..WorkflowState::default()
                },
            };
            Ok((next, Effect::None))
        }

        WorkflowEvent::UploadFailed { upload, message } => {
            if !matches!(status, FlowStatus::Uploading | FlowStatus::Processing) {
                return Err(unexpected());
            }
            // The file comes back so the same upload can be retried as is.
            let next = WorkflowState {
                selected_file: Some(upload),
                status: FlowStatus::Error,
                error: Some(WorkflowFailure::new(FailureKind::Transport, message)),
                ..WorkflowState::default()
            };
            Ok((next, Effect::None))
        }

        WorkflowEvent::RecallCheckRequested => {
            if status.is_in_flight() {
                return Err(WorkflowError::Busy { status });
            }
            let session_id = match (&state.session_id, status) {
                (Some(id), FlowStatus::Ready | FlowStatus::Error) => id.clone(),
                _ => return Err(WorkflowError::NotReady { status }),
            };
            let next = WorkflowState {
                status: FlowStatus::Checking,
                error: None,
                ..state.clone()
            };
            Ok((next, Effect::CheckRecalls(session_id)))
        }

        WorkflowEvent::RecallCheckCompleted(outcome) => {
            if status != FlowStatus::Checking {
                return Err(unexpected());
            }
            let next = match outcome {
                RecallOutcome::Checked { items, matches } => WorkflowState {
                    status: FlowStatus::Done,
                    purchased_items: items.unwrap_or_else(|| state.purchased_items.clone()),
                    recall_matches: Some(matches),
                    error: None,
                    ..state.clone()
                },
                RecallOutcome::MatchingFailed {
                    items,
                    matches,
                    message,
                } => WorkflowState {
                    status: FlowStatus::Error,
                    purchased_items: items.unwrap_or_else(|| state.purchased_items.clone()),
                    recall_matches: matches.or_else(|| state.recall_matches.clone()),
                    error: Some(WorkflowFailure::new(FailureKind::Matching, message)),
                    ..state.clone()
                },
            };
            Ok((next, Effect::None))
        }

        WorkflowEvent::RecallCheckFailed { message } => {
            if status != FlowStatus::Checking {
                return Err(unexpected());
            }
            let next = WorkflowState {
                status: FlowStatus::Error,
                error: Some(WorkflowFailure::new(FailureKind::Transport, message)),
                ..state.clone()
            };
            Ok((next, Effect::None))
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;

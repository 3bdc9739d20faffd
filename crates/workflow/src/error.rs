use thiserror::Error;

use crate::state::FlowStatus;

/// Rejected intents. A rejection never changes the workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("a receipt is already being processed ({status}); wait for it to finish or start over")]
    Busy { status: FlowStatus },
    #[error("select a receipt image before uploading")]
    NoFileSelected,
    #[error("recalls can only be checked once receipt items are ready (status: {status})")]
    NotReady { status: FlowStatus },
    #[error("{event} does not apply while the workflow is {status}")]
    UnexpectedEvent {
        event: &'static str,
        status: FlowStatus,
    },
}

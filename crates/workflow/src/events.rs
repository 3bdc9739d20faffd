//! Workflow events, classified remote outcomes, and the effects the reducer
//! asks the controller to run.

use shared::{
    domain::{PurchasedItem, ReceiptUpload, RecallMatch, SessionId},
    protocol::ReceiptSession,
};

pub const NO_ITEMS_MESSAGE: &str =
    "No items were detected on this receipt. Try again with a clearer photo.";

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    FileSelected(ReceiptUpload),
    UploadRequested,
    UploadProcessing,
    UploadCompleted(UploadOutcome),
    UploadFailed {
        upload: ReceiptUpload,
        message: String,
    },
    RecallCheckRequested,
    RecallCheckCompleted(RecallOutcome),
    RecallCheckFailed {
        message: String,
    },
    Reset,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::FileSelected(_) => "file_selected",
            WorkflowEvent::UploadRequested => "upload_requested",
            WorkflowEvent::UploadProcessing => "upload_processing",
            WorkflowEvent::UploadCompleted(_) => "upload_completed",
            WorkflowEvent::UploadFailed { .. } => "upload_failed",
            WorkflowEvent::RecallCheckRequested => "recall_check_requested",
            WorkflowEvent::RecallCheckCompleted(_) => "recall_check_completed",
            WorkflowEvent::RecallCheckFailed { .. } => "recall_check_failed",
            WorkflowEvent::Reset => "reset",
        }
    }

    /// Events produced by a remote call rather than by the user.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            WorkflowEvent::UploadProcessing
                | WorkflowEvent::UploadCompleted(_)
                | WorkflowEvent::UploadFailed { .. }
                | WorkflowEvent::RecallCheckCompleted(_)
                | WorkflowEvent::RecallCheckFailed { .. }
        )
    }

    /// Responses that end the outstanding call.
    pub fn closes_flight(&self) -> bool {
        self.is_response() && !matches!(self, WorkflowEvent::UploadProcessing)
    }
}

/// Work the controller must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Upload(ReceiptUpload),
    CheckRecalls(SessionId),
}

/// Result of the extraction phase.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Extracted {
        session_id: SessionId,
        items: Vec<PurchasedItem>,
    },
    ExtractionFailed {
        session_id: SessionId,
        items: Vec<PurchasedItem>,
        message: String,
    },
    NoItems {
        session_id: SessionId,
    },
}

impl From<ReceiptSession> for UploadOutcome {
    fn from(session: ReceiptSession) -> Self {
        let items = session.purchased_items.unwrap_or_default();
        if let Some(message) =
            extraction_error_message(session.ocr_error.as_deref(), session.llm_error.as_deref())
        {
            return UploadOutcome::ExtractionFailed {
                session_id: session.id,
                items,
                message,
            };
        }
        if items.is_empty() {
            UploadOutcome::NoItems {
                session_id: session.id,
            }
        } else {
            UploadOutcome::Extracted {
                session_id: session.id,
                items,
            }
        }
    }
}

fn extraction_error_message(ocr_error: Option<&str>, llm_error: Option<&str>) -> Option<String> {
    let parts: Vec<String> = [
        ocr_error.map(|e| format!("Could not read the receipt text: {e}")),
        llm_error.map(|e| format!("Could not interpret the receipt items: {e}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Result of the recall-matching phase. `None` fields mean the server sent
/// nothing and the previous view should stay.
#[derive(Debug, Clone, PartialEq)]
pub enum RecallOutcome {
    Checked {
        items: Option<Vec<PurchasedItem>>,
        matches: Vec<RecallMatch>,
    },
    MatchingFailed {
        items: Option<Vec<PurchasedItem>>,
        matches: Option<Vec<RecallMatch>>,
        message: String,
    },
}

impl From<ReceiptSession> for RecallOutcome {
    fn from(session: ReceiptSession) -> Self {
        match session.llm_error {
            Some(error) => RecallOutcome::MatchingFailed {
                items: session.purchased_items,
                matches: session.recall_matches,
                message: format!("Recall matching failed: {error}"),
            },
            None => RecallOutcome::Checked {
                items: session.purchased_items,
                matches: session.recall_matches.unwrap_or_default(),
            },
        }
    }
}

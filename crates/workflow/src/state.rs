use std::fmt;

use shared::domain::{PurchasedItem, ReceiptUpload, RecallMatch, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Ready,
    Checking,
    Done,
    Error,
}

impl FlowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowStatus::Idle => "idle",
            FlowStatus::Uploading => "uploading",
            FlowStatus::Processing => "processing",
            FlowStatus::Ready => "ready",
            FlowStatus::Checking => "checking",
            FlowStatus::Done => "done",
            FlowStatus::Error => "error",
        }
    }

    /// True while a remote call for the session is outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            FlowStatus::Uploading | FlowStatus::Processing | FlowStatus::Checking
        )
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network failure, non-success status or timeout.
    Transport,
    /// OCR or item interpretation reported an error.
    Extraction,
    /// Extraction succeeded but found nothing; the user should retake the photo.
    NoItems,
    /// Recall matching reported an error; known items stay visible.
    Matching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl WorkflowFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything a view may render. Only the store writes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowState {
    pub selected_file: Option<ReceiptUpload>,
    pub status: FlowStatus,
    pub session_id: Option<SessionId>,
    pub purchased_items: Vec<PurchasedItem>,
    pub recall_matches: Option<Vec<RecallMatch>>,
    pub error: Option<WorkflowFailure>,
}

impl WorkflowState {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|failure| failure.message.as_str())
    }

    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && !self.status.is_in_flight()
    }

    pub fn can_check_recalls(&self) -> bool {
        self.session_id.is_some() && matches!(self.status, FlowStatus::Ready | FlowStatus::Error)
    }

    /// Describes the first field combination no view should ever observe.
    pub fn inconsistency(&self) -> Option<&'static str> {
        let has_error = self.error.is_some();
        if (self.status == FlowStatus::Error) != has_error {
            return Some("error details must be present exactly when status is error");
        }
        match self.status {
            FlowStatus::Idle if self.session_id.is_some() => Some("idle with a session id"),
            FlowStatus::Uploading | FlowStatus::Processing
                if self.session_id.is_some() || self.selected_file.is_some() =>
            {
                Some("upload in flight still carries a file or session id")
            }
            FlowStatus::Ready if self.purchased_items.is_empty() => Some("ready without items"),
            FlowStatus::Ready | FlowStatus::Checking | FlowStatus::Done
                if self.session_id.is_none() =>
            {
                Some("session phase without a session id")
            }
            FlowStatus::Done if self.recall_matches.is_none() => {
                Some("done without recall matches")
            }
            _ => None,
        }
    }
}

use std::fmt;

use thiserror::Error;

/// Remote operations exposed by the receipt backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    UploadReceipt,
    FetchSession,
    CheckRecalls,
    ListRecentRecalls,
    DeleteSession,
}

impl ApiOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiOperation::UploadReceipt => "upload receipt",
            ApiOperation::FetchSession => "get session",
            ApiOperation::CheckRecalls => "check recalls",
            ApiOperation::ListRecentRecalls => "get recent recalls",
            ApiOperation::DeleteSession => "delete session",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Failed to upload receipt: {reason}")]
    InvalidUpload { reason: String },
    #[error("Failed to {operation}: {status_text}")]
    Status {
        operation: ApiOperation,
        status: u16,
        status_text: String,
    },
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: ApiOperation,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to {operation}: unreadable response body: {source}")]
    Decode {
        operation: ApiOperation,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to {operation}: server returned session {actual}, expected {expected}")]
    SessionMismatch {
        operation: ApiOperation,
        expected: String,
        actual: String,
    },
}

impl ApiClientError {
    pub fn operation(&self) -> Option<ApiOperation> {
        match self {
            ApiClientError::InvalidBaseUrl { .. } => None,
            ApiClientError::InvalidUpload { .. } => Some(ApiOperation::UploadReceipt),
            ApiClientError::Status { operation, .. }
            | ApiClientError::Transport { operation, .. }
            | ApiClientError::Decode { operation, .. }
            | ApiClientError::SessionMismatch { operation, .. } => Some(*operation),
        }
    }

    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

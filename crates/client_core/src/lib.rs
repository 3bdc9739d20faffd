//! Typed boundary between the receipt workflow and the backend HTTP API.

use async_trait::async_trait;
use shared::{
    domain::{ReceiptUpload, SessionId},
    protocol::{CheckRecallsResponse, RecallSummary, ReceiptSession},
};

pub mod error;
mod http;

pub use error::{ApiClientError, ApiOperation};
pub use http::HttpReceiptClient;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";

/// Remote procedures the workflow depends on. Implementations return data or
/// fail; they never hold workflow state.
#[async_trait]
pub trait ReceiptApi: Send + Sync {
    async fn upload_receipt(&self, upload: &ReceiptUpload)
        -> Result<ReceiptSession, ApiClientError>;
    async fn fetch_session(&self, id: &SessionId) -> Result<ReceiptSession, ApiClientError>;
    async fn check_recalls(&self, id: &SessionId)
        -> Result<CheckRecallsResponse, ApiClientError>;
    async fn list_recent_recalls(&self) -> Result<Vec<RecallSummary>, ApiClientError>;
    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiClientError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{ReceiptUpload, SessionId},
    protocol::{CheckRecallsResponse, RecallSummary, ReceiptSession},
};
use tracing::debug;
use url::Url;

use crate::{ApiClientError, ApiOperation, ReceiptApi};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub struct HttpReceiptClient {
    http: Client,
    base_url: Url,
}

impl HttpReceiptClient {
    pub fn new(base_url: &str) -> Result<Self, ApiClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ApiClientError> {
        let parsed = Url::parse(base_url).map_err(|e| ApiClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ApiClientError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn receipt_endpoint(&self, id: &SessionId, action: Option<&str>) -> Url {
        match action {
            Some(action) => self.endpoint(&["api", "receipts", id.as_str(), action]),
            None => self.endpoint(&["api", "receipts", id.as_str()]),
        }
    }

    async fn send(
        &self,
        operation: ApiOperation,
        request: RequestBuilder,
    ) -> Result<Response, ApiClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiClientError::Transport { operation, source })?;

        let status = response.status();
        debug!(operation = %operation, status = status.as_u16(), "receipt api responded");
        if !status.is_success() {
            // hyper only keeps the reason phrase when it differs from the
            // canonical one for the code.
            let status_text = response
                .extensions()
                .get::<ReasonPhrase>()
                .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(ApiClientError::Status {
                operation,
                status: status.as_u16(),
                status_text,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: ApiOperation,
        request: RequestBuilder,
    ) -> Result<T, ApiClientError> {
        self.send(operation, request)
            .await?
            .json()
            .await
            .map_err(|source| ApiClientError::Decode { operation, source })
    }
}

fn ensure_same_session(
    operation: ApiOperation,
    expected: &SessionId,
    session: &ReceiptSession,
) -> Result<(), ApiClientError> {
    if &session.id != expected {
        return Err(ApiClientError::SessionMismatch {
            operation,
            expected: expected.to_string(),
            actual: session.id.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl ReceiptApi for HttpReceiptClient {
    async fn upload_receipt(
        &self,
        upload: &ReceiptUpload,
    ) -> Result<ReceiptSession, ApiClientError> {
        let mime_type = upload.mime_type.as_deref().unwrap_or(FALLBACK_MIME_TYPE);
        let part = multipart::Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(mime_type)
            .map_err(|e| ApiClientError::InvalidUpload {
                reason: format!("invalid content type '{mime_type}': {e}"),
            })?;
        let form = multipart::Form::new().part("file", part);

        let url = self.endpoint(&["api", "receipts"]);
        debug!(
            file_name = %upload.file_name,
            size_bytes = upload.len(),
            "uploading receipt"
        );
        self.send_json(
            ApiOperation::UploadReceipt,
            self.http.post(url).multipart(form),
        )
        .await
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<ReceiptSession, ApiClientError> {
        let operation = ApiOperation::FetchSession;
        let session: ReceiptSession = self
            .send_json(operation, self.http.get(self.receipt_endpoint(id, None)))
            .await?;
        ensure_same_session(operation, id, &session)?;
        Ok(session)
    }

    async fn check_recalls(
        &self,
        id: &SessionId,
    ) -> Result<CheckRecallsResponse, ApiClientError> {
        let operation = ApiOperation::CheckRecalls;
        let response: CheckRecallsResponse = self
            .send_json(
                operation,
                self.http
                    .post(self.receipt_endpoint(id, Some("check-recalls"))),
            )
            .await?;
        ensure_same_session(operation, id, &response.updated_matches)?;
        Ok(response)
    }

    async fn list_recent_recalls(&self) -> Result<Vec<RecallSummary>, ApiClientError> {
        self.send_json(
            ApiOperation::ListRecentRecalls,
            self.http.get(self.endpoint(&["api", "recalls", "sample"])),
        )
        .await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), ApiClientError> {
        self.send(
            ApiOperation::DeleteSession,
            self.http.delete(self.receipt_endpoint(id, None)),
        )
        .await?;
        Ok(())
    }
}

//! Session workflow controller: turns user intents into store transitions
//! and runs the remote calls those transitions ask for.

use std::{future::Future, sync::Arc, time::Duration};

use client_core::{ApiOperation, ReceiptApi};
use shared::domain::{ReceiptUpload, SessionId};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{info, warn};

use crate::{
    error::WorkflowError,
    events::{Effect, RecallOutcome, UploadOutcome, WorkflowEvent},
    state::WorkflowState,
    store::{FlightTicket, Settled, StateReader, StateStore},
};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_PROCESSING_HINT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Upper bound for any single remote call.
    pub call_timeout: Duration,
    /// How long an upload may stay outstanding before the status moves from
    /// `uploading` to `processing`.
    pub processing_hint: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            processing_hint: DEFAULT_PROCESSING_HINT,
        }
    }
}

pub struct WorkflowController {
    api: Arc<dyn ReceiptApi>,
    store: StateStore,
    config: WorkflowConfig,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn ReceiptApi>) -> Self {
        Self::with_config(api, WorkflowConfig::default())
    }

    pub fn with_config(api: Arc<dyn ReceiptApi>, config: WorkflowConfig) -> Self {
        Self {
            api,
            store: StateStore::new(),
            config,
        }
    }

    pub fn snapshot(&self) -> WorkflowState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> StateReader {
        self.store.subscribe()
    }

    /// Starts over with `file`. Rejected while a call is outstanding.
    pub fn select_file(&self, file: ReceiptUpload) -> Result<(), WorkflowError> {
        let file_name = file.file_name.clone();
        self.store.dispatch(WorkflowEvent::FileSelected(file))?;
        info!(file_name = %file_name, "receipt selected");
        Ok(())
    }

    pub async fn submit_upload(&self) -> Result<Settled, WorkflowError> {
        let (effect, ticket) = self.store.dispatch(WorkflowEvent::UploadRequested)?;
        Ok(self.run(effect, ticket).await)
    }

    pub async fn request_recall_check(&self) -> Result<Settled, WorkflowError> {
        let (effect, ticket) = self.store.dispatch(WorkflowEvent::RecallCheckRequested)?;
        Ok(self.run(effect, ticket).await)
    }

    /// Returns to the initial state from any status. A call still outstanding
    /// keeps running but its response is dropped.
    pub fn reset(&self) {
        if let Err(err) = self.store.dispatch(WorkflowEvent::Reset) {
            warn!(%err, "reset rejected");
        }
    }

    /// Resets and deletes the tracked server session in the background.
    /// Deletion failures are logged only. Returns `None` when there was no
    /// session to delete or no Tokio runtime to run the deletion on.
    pub fn discard(&self) -> Option<JoinHandle<()>> {
        let session_id = self.store.snapshot().session_id;
        self.reset();
        let session_id = session_id?;

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%session_id, %err, "no runtime available to delete receipt session");
                return None;
            }
        };

        let api = Arc::clone(&self.api);
        let timeout = self.config.call_timeout;
        Some(handle.spawn(async move {
            delete_session_best_effort(api, session_id, timeout).await;
        }))
    }

    async fn run(&self, effect: Effect, ticket: FlightTicket) -> Settled {
        match effect {
            Effect::None => Settled::Applied(self.store.snapshot().status),
            Effect::Upload(upload) => self.upload(upload, ticket).await,
            Effect::CheckRecalls(session_id) => self.check_recalls(session_id, ticket).await,
        }
    }

    async fn upload(&self, upload: ReceiptUpload, ticket: FlightTicket) -> Settled {
        info!(
            file_name = %upload.file_name,
            size_bytes = upload.len(),
            "uploading receipt"
        );

        let call = self.api.upload_receipt(&upload);
        let event = match self.bounded(call, Some(&ticket)).await {
            Some(Ok(session)) => {
                let outcome = UploadOutcome::from(session);
                match &outcome {
                    UploadOutcome::Extracted { session_id, items } => {
                        info!(%session_id, items = items.len(), "receipt items extracted")
                    }
                    UploadOutcome::ExtractionFailed {
                        session_id,
                        message,
                        ..
                    } => warn!(%session_id, %message, "receipt extraction failed"),
                    UploadOutcome::NoItems { session_id } => {
                        warn!(%session_id, "no items detected on receipt")
                    }
                }
                WorkflowEvent::UploadCompleted(outcome)
            }
            Some(Err(err)) => {
                warn!(%err, "receipt upload failed");
                WorkflowEvent::UploadFailed {
                    upload,
                    message: err.to_string(),
                }
            }
            None => {
                let message = timeout_message(ApiOperation::UploadReceipt, self.config.call_timeout);
                warn!(%message, "receipt upload timed out");
                WorkflowEvent::UploadFailed { upload, message }
            }
        };

        self.store.settle(&ticket, event)
    }

    async fn check_recalls(&self, session_id: SessionId, ticket: FlightTicket) -> Settled {
        info!(%session_id, "checking receipt items against recalls");

        let call = self.api.check_recalls(&session_id);
        let event = match self.bounded(call, None).await {
            Some(Ok(response)) => {
                let outcome = RecallOutcome::from(response.updated_matches);
                match &outcome {
                    RecallOutcome::Checked { matches, .. } => {
                        info!(%session_id, matches = matches.len(), message = %response.message, "recall check finished")
                    }
                    RecallOutcome::MatchingFailed { message, .. } => {
                        warn!(%session_id, %message, "recall matching failed")
                    }
                }
                WorkflowEvent::RecallCheckCompleted(outcome)
            }
            Some(Err(err)) => {
                warn!(%session_id, %err, "recall check failed");
                WorkflowEvent::RecallCheckFailed {
                    message: err.to_string(),
                }
            }
            None => {
                let message = timeout_message(ApiOperation::CheckRecalls, self.config.call_timeout);
                warn!(%session_id, %message, "recall check timed out");
                WorkflowEvent::RecallCheckFailed { message }
            }
        };

        self.store.settle(&ticket, event)
    }

    /// Runs `call` under the configured timeout. With `processing` set, the
    /// upload is marked as processing once the hint delay passes.
    async fn bounded<F>(&self, call: F, processing: Option<&FlightTicket>) -> Option<F::Output>
    where
        F: Future,
    {
        // An unrepresentable deadline means the call is not bounded at all.
        let deadline = Instant::now().checked_add(self.config.call_timeout);
        tokio::pin!(call);

        let hint = processing.and_then(|ticket| {
            let at = Instant::now().checked_add(self.config.processing_hint)?;
            Some((ticket, deadline.map_or(at, |deadline| at.min(deadline))))
        });
        if let Some((ticket, at)) = hint {
            match time::timeout_at(at, &mut call).await {
                Ok(output) => return Some(output),
                Err(_) => {
                    self.store.settle(ticket, WorkflowEvent::UploadProcessing);
                }
            }
        }

        match deadline {
            Some(deadline) => time::timeout_at(deadline, call).await.ok(),
            None => Some(call.await),
        }
    }
}

async fn delete_session_best_effort(
    api: Arc<dyn ReceiptApi>,
    session_id: SessionId,
    timeout: Duration,
) {
    match time::timeout(timeout, api.delete_session(&session_id)).await {
        Ok(Ok(())) => info!(%session_id, "receipt session deleted"),
        Ok(Err(err)) => warn!(%session_id, %err, "failed to delete receipt session"),
        Err(_) => warn!(%session_id, "timed out deleting receipt session"),
    }
}

fn timeout_message(operation: ApiOperation, timeout: Duration) -> String {
    format!(
        "Failed to {operation}: no response after {}s",
        timeout.as_secs_f32()
    )
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

//! Single-writer holder of [`WorkflowState`].
//!
//! The controller owns the [`StateStore`]; views hold [`StateReader`]s. Each
//! write runs the reducer inside the watch channel's write lock, so status
//! checks and the state replacement happen as one step.

use std::sync::atomic::{AtomicU64, Ordering};

use shared::domain::SessionId;
use tokio::sync::watch;
use tracing::debug;

use crate::{
    error::WorkflowError,
    events::{Effect, WorkflowEvent},
    reducer::reduce,
    state::{FlowStatus, WorkflowState},
};

/// Tag carried by an outstanding remote call. A response is applied only
/// while its ticket still matches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightTicket {
    epoch: u64,
    session_id: Option<SessionId>,
}

/// What happened to a remote call's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied(FlowStatus),
    /// The workflow moved on (reset, new file) before the response arrived.
    Discarded,
}

pub struct StateStore {
    tx: watch::Sender<WorkflowState>,
    epoch: AtomicU64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(WorkflowState::default());
        Self {
            tx,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> WorkflowState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> StateReader {
        StateReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Applies a user intent and opens a new flight epoch. Any call still
    /// outstanding from an earlier epoch is orphaned.
    pub(crate) fn dispatch(
        &self,
        event: WorkflowEvent,
    ) -> Result<(Effect, FlightTicket), WorkflowError> {
        let event_name = event.name();
        let mut outcome = None;

        self.tx.send_if_modified(|state| match reduce(state, event) {
            Ok((next, effect)) => {
                let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
                let ticket = FlightTicket {
                    epoch,
                    session_id: next.session_id.clone(),
                };
                debug!(event = event_name, from = %state.status, to = %next.status, "workflow transition");
                let changed = *state != next;
                *state = next;
                outcome = Some(Ok((effect, ticket)));
                changed
            }
            Err(err) => {
                debug!(event = event_name, %err, "workflow intent rejected");
                outcome = Some(Err(err));
                false
            }
        });

        outcome.unwrap_or_else(|| {
            Err(WorkflowError::UnexpectedEvent {
                event: event_name,
                status: self.tx.borrow().status,
            })
        })
    }

    /// Applies a remote response if `ticket` is still current.
    pub(crate) fn settle(&self, ticket: &FlightTicket, event: WorkflowEvent) -> Settled {
        let event_name = event.name();
        let closes_flight = event.closes_flight();
        let mut settled = Settled::Discarded;

        self.tx.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != ticket.epoch
                || state.session_id != ticket.session_id
            {
                debug!(event = event_name, "discarding response for a superseded session");
                return false;
            }
            match reduce(state, event) {
                Ok((next, _)) => {
                    if closes_flight {
                        self.epoch.fetch_add(1, Ordering::SeqCst);
                    }
                    debug!(event = event_name, from = %state.status, to = %next.status, "workflow transition");
                    settled = Settled::Applied(next.status);
                    let changed = *state != next;
                    *state = next;
                    changed
                }
                Err(err) => {
                    debug!(event = event_name, %err, "discarding response that no longer applies");
                    false
                }
            }
        });

        settled
    }
}

/// Read side of the store handed to views.
#[derive(Clone)]
pub struct StateReader {
    rx: watch::Receiver<WorkflowState>,
}

impl StateReader {
    pub fn current(&self) -> WorkflowState {
        self.rx.borrow().clone()
    }

    /// Waits for the next replacement. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<WorkflowState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits until the state satisfies `predicate`, checking the current
    /// state first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&WorkflowState) -> bool,
    ) -> Option<WorkflowState> {
        let state = self.rx.wait_for(predicate).await.ok()?;
        Some(state.clone())
    }
}

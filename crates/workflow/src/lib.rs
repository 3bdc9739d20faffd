//! Receipt session workflow: one in-flight session, two dependent remote
//! calls (extraction, then recall matching), and a single-writer state store
//! views subscribe to.

pub mod controller;
pub mod error;
pub mod events;
pub mod reducer;
pub mod state;
pub mod store;

pub use controller::{WorkflowConfig, WorkflowController};
pub use error::WorkflowError;
pub use events::{Effect, RecallOutcome, UploadOutcome, WorkflowEvent};
pub use state::{FailureKind, FlowStatus, WorkflowFailure, WorkflowState};
pub use store::{FlightTicket, Settled, StateReader, StateStore};

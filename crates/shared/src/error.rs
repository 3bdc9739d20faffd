use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("session id must not be empty")]
    EmptySessionId,
    #[error("receipt file '{file_name}' is empty")]
    EmptyReceipt { file_name: String },
}

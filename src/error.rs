use std::time::Duration;

use thiserror::Error;

/// Failure taxonomy shared by the producer and both consumer roles.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Error originating from the underlying `lapin` library.
    #[error("broker communication error: {0}")]
    Broker(#[from] lapin::Error),

    /// Error during message serialization or deserialization.
    #[error("failed to encode or decode message payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Every connection attempt failed; the process cannot start.
    #[error("connection failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// The broker did not confirm a publish within the bounded wait.
    #[error("broker did not confirm publish within {0:?}")]
    ConfirmTimeout(Duration),

    /// The broker negatively confirmed a publish.
    #[error("broker rejected published message")]
    PublishNotConfirmed,

    /// Shutdown was requested while waiting; not a fault.
    #[error("shutdown requested")]
    Cancelled,

    /// Error from the event handler logic.
    #[error("event handler failed: {0}")]
    Handler(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl MessagingError {
    /// Process exit status for a fatal error. Exhausted connection retries
    /// get a distinct code so a supervisor can tell "broker unreachable at
    /// startup" from a mid-run fault.
    pub fn exit_code(&self) -> i32 {
        match self {
            MessagingError::RetriesExhausted { .. } => 2,
            _ => 1,
        }
    }
}

impl From<&str> for MessagingError {
    fn from(s: &str) -> Self {
        MessagingError::Handler(s.to_string().into())
    }
}

impl From<String> for MessagingError {
    fn from(s: String) -> Self {
        MessagingError::Handler(s.into())
    }
}

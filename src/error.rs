//! Error types for the survey pipeline

use thiserror::Error;

pub type SurveyResult<T> = Result<T, SurveyError>;

#[derive(Error, Debug)]
pub enum SurveyError {
    /// Malformed identity number. Recoverable: the operator corrects input.
    #[error("invalid identity format: expected exactly 12 digits")]
    InvalidFormat,

    /// The identity already holds a dedup slot on this device.
    #[error("identity already surveyed on this device")]
    DuplicateIdentity,

    /// Camera or location permission refused. Terminal for the current
    /// survey attempt; the consumed dedup slot is not rolled back.
    #[error("{capability} capability denied: {message}")]
    CapabilityDenied { capability: String, message: String },

    /// Transport error, non-success response, or timeout from the
    /// submission endpoint. Never fatal: the record stays PENDING.
    #[error("delivery failed: {0}")]
    DeliveryFailure(String),

    /// A capture action attempted outside the state that enables it.
    #[error("capture action not allowed in state {state}")]
    CaptureBlocked { state: &'static str },

    /// An orchestrator operation invoked out of stage order.
    #[error("operation requires stage {expected}, flow is at {actual}")]
    StageMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

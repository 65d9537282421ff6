//! Error types for tabchat.
//!
//! Every kind here is recoverable: the presentation layer turns each into a
//! user-visible message and the session continues.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TabchatError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session limit exceeded: max {0} concurrent sessions")]
    SessionLimitExceeded(usize),

    #[error("No API credential set for this session")]
    CredentialMissing,

    #[error("Could not parse uploaded data: {0}")]
    UploadParseFailure(String),

    #[error("Could not extract a column pair: {0}")]
    ExtractionFailure(String),

    #[error("Unknown column: {0}")]
    ColumnNotFound(String),

    #[error("No dataset uploaded for this session")]
    DatasetMissing,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Code execution failed: {0}")]
    ExecutionFailure(String),

    #[error("Completion request failed: {0}")]
    CompletionFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TabchatError {
    /// Stable machine-readable code used in notices and API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            TabchatError::SessionNotFound(_) => "session_not_found",
            TabchatError::SessionLimitExceeded(_) => "session_limit_exceeded",
            TabchatError::CredentialMissing => "credential_missing",
            TabchatError::UploadParseFailure(_) => "upload_parse_failure",
            TabchatError::ExtractionFailure(_) => "extraction_failure",
            TabchatError::ColumnNotFound(_) => "column_not_found",
            TabchatError::DatasetMissing => "dataset_missing",
            TabchatError::InvalidRequest(_) => "invalid_request",
            TabchatError::ExecutionFailure(_) => "execution_failure",
            TabchatError::CompletionFailed(_) => "completion_failed",
            TabchatError::Http(_) => "http_error",
            TabchatError::IoError(_) => "io_error",
            TabchatError::JsonError(_) => "json_error",
        }
    }
}

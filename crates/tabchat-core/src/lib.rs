//! Core conversation-context assembly, response routing and session
//! management for tabchat.

mod completion;
mod context;
mod error;
mod execute;
mod extract;
mod router;
mod session;
mod upload;

pub use completion::{
    ApiCredential, CompletionClient, CompletionConfig, CompletionEvent,
};
pub use context::assemble_turns;
pub use error::TabchatError;
pub use execute::{DisabledSink, ExecutionSink, ProcessSink};
pub use extract::extract_column_pair;
pub use router::classify_reply;
pub use session::{
    SessionContext, SessionEvent, SessionManager, SessionManagerConfig,
};
pub use upload::parse_dataset;

/// Result type for tabchat operations.
pub type Result<T> = std::result::Result<T, TabchatError>;

//! Shared types for the tabchat data-chat service.

mod chart;
mod chat;
mod envelope;
mod session;
mod snapshot;
mod ws;

pub use chart::*;
pub use chat::*;
pub use envelope::*;
pub use session::*;
pub use snapshot::*;
pub use ws::*;

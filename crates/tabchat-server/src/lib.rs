//! Tabchat server library.
//!
//! Exposes modules for integration testing.

pub mod config;
pub mod error;
pub mod exchange;
pub mod logging;
pub mod routes;
pub mod state;
pub mod websocket;

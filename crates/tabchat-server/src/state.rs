//! Shared application state.

use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tabchat_core::{
    CompletionClient, CompletionConfig, DisabledSink, ExecutionSink, ProcessSink,
    SessionManager, SessionManagerConfig,
};

/// Shared application state.
pub struct AppState {
    pub session_manager: Arc<SessionManager>,
    pub completion: Arc<CompletionClient>,
    pub execution: Arc<dyn ExecutionSink>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let session_manager = Arc::new(SessionManager::new(SessionManagerConfig {
            max_concurrent_sessions: config.max_concurrent_sessions,
            preview_rows: config.preview_rows,
        }));

        let completion = Arc::new(CompletionClient::new(CompletionConfig {
            base_url: config.endpoint_url.clone(),
            model: config.default_model.clone(),
            idle_timeout: Duration::from_secs(config.stream_idle_timeout_secs),
        }));

        let execution: Arc<dyn ExecutionSink> = if config.enable_code_execution {
            Arc::new(ProcessSink::new(
                config.code_command.clone(),
                config.code_args.clone(),
                Duration::from_secs(config.code_timeout_secs),
            ))
        } else {
            Arc::new(DisabledSink)
        };

        Self {
            session_manager,
            completion,
            execution,
            config,
        }
    }
}

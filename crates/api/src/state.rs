use std::sync::Arc;

use launchpad_core::dispatch::TriggerGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Non-blocking entry point into the per-script debounce queues.
    pub gateway: Arc<TriggerGateway>,
    /// Resolved server configuration.
    pub config: Arc<ServerConfig>,
}

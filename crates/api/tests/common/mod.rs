#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use tower::ServiceExt;

use launchpad_api::config::{LogFormat, ServerConfig};
use launchpad_api::router::build_app_router;
use launchpad_api::state::AppState;
use launchpad_core::dispatch::TriggerGateway;
use launchpad_core::scripting::RunnerConfig;

/// Build a test `ServerConfig` mounted at `prefix`, with short deadlines.
pub fn test_config(prefix: &str) -> ServerConfig {
    ServerConfig {
        scripts_dir: PathBuf::from("/srv/hooks"),
        listen_addr: "127.0.0.1:0".to_string(),
        trigger_prefix: prefix.to_string(),
        runner: RunnerConfig {
            run_timeout: Duration::from_secs(5),
            grace_timeout: Duration::from_secs(1),
        },
        shutdown_timeout: Duration::from_secs(5),
        log_format: LogFormat::Text,
    }
}

/// Build the full application router around `gateway`, exercising the same
/// middleware stack production uses.
pub fn build_test_app(gateway: Arc<TriggerGateway>, config: ServerConfig) -> Router {
    let state = AppState {
        gateway,
        config: Arc::new(config),
    };
    build_app_router(state)
}

/// Send a bodiless request through the router.
pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

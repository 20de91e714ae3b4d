//! Integration tests for the trigger endpoint.
//!
//! Every request is answered 202 whatever happened to it; the tests inspect
//! the gateway to see what actually got queued.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{build_test_app, get, send, test_config};
use tokio_util::sync::CancellationToken;

use launchpad_core::dispatch::{self, DispatchSummary, Dispatcher, TriggerGateway};
use launchpad_core::registry::ScriptRegistry;
use launchpad_core::scripting::{CommandSpec, ProcessRunner};

fn registry() -> ScriptRegistry {
    ScriptRegistry::new()
        .with("build", CommandSpec::new("/bin/sleep").arg("0.1"))
        .with("nightly build", CommandSpec::new("/bin/true"))
}

fn wired() -> (Arc<TriggerGateway>, Dispatcher<ProcessRunner>) {
    let config = test_config("/");
    let (gateway, dispatcher) = dispatch::wire(&registry(), ProcessRunner::new(config.runner));
    (Arc::new(gateway), dispatcher)
}

// ---------------------------------------------------------------------------
// Test: unknown key is accepted and queues nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_key_returns_accepted() {
    let (gateway, _dispatcher) = wired();
    let app = build_test_app(Arc::clone(&gateway), test_config("/"));

    let response = get(app, "/does-not-exist").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(gateway.is_pending("build"), Some(false));
    assert_eq!(gateway.is_pending("does-not-exist"), None);
}

// ---------------------------------------------------------------------------
// Test: known key is accepted, queued once, with an empty body
// ---------------------------------------------------------------------------

#[tokio::test]
async fn known_key_is_queued() {
    let (gateway, _dispatcher) = wired();
    let app = build_test_app(Arc::clone(&gateway), test_config("/"));

    let response = get(app, "/build").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(gateway.is_pending("build"), Some(true));

    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(body.is_empty(), "trigger response must have no body");
}

// ---------------------------------------------------------------------------
// Test: repeated triggers are all accepted but collapse
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_triggers_collapse_into_one_pending_run() {
    let (gateway, dispatcher) = wired();
    let app = build_test_app(Arc::clone(&gateway), test_config("/"));

    for _ in 0..5 {
        let response = get(app.clone(), "/build").await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    assert_eq!(gateway.is_pending("build"), Some(true));

    drop(app);
    drop(gateway);
    let summary = drain(dispatcher).await;
    assert_eq!(summary.runs, 1);
}

// ---------------------------------------------------------------------------
// Test: method does not matter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn any_method_triggers() {
    for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
        let (gateway, _dispatcher) = wired();
        let app = build_test_app(Arc::clone(&gateway), test_config("/"));

        let response = send(app, method.clone(), "/build").await;

        assert_eq!(response.status(), StatusCode::ACCEPTED, "method {method}");
        assert_eq!(gateway.is_pending("build"), Some(true), "method {method}");
    }
}

// ---------------------------------------------------------------------------
// Test: percent-encoded paths map to decoded keys
// ---------------------------------------------------------------------------

#[tokio::test]
async fn percent_encoded_key_is_decoded() {
    let (gateway, _dispatcher) = wired();
    let app = build_test_app(Arc::clone(&gateway), test_config("/"));

    let response = get(app, "/nightly%20build").await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(gateway.is_pending("nightly build"), Some(true));
}

// ---------------------------------------------------------------------------
// Test: custom prefix
// ---------------------------------------------------------------------------

#[tokio::test]
async fn custom_prefix_scopes_triggers() {
    let (gateway, _dispatcher) = wired();
    let app = build_test_app(Arc::clone(&gateway), test_config("/hooks/"));

    for path in ["/build", "/hooks", "/other/build"] {
        let outside = get(app.clone(), path).await;
        assert_eq!(outside.status(), StatusCode::ACCEPTED, "path {path}");
        assert_eq!(gateway.is_pending("build"), Some(false), "path {path}");
    }

    let inside = get(app, "/hooks/build").await;
    assert_eq!(inside.status(), StatusCode::ACCEPTED);
    assert_eq!(gateway.is_pending("build"), Some(true));
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let (gateway, _dispatcher) = wired();
    let app = build_test_app(gateway, test_config("/"));

    let response = get(app, "/build").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36, "x-request-id should be a UUID string");
}

// ---------------------------------------------------------------------------
// Test: concurrent burst runs the script exactly once
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_burst_executes_script_once() {
    let (gateway, dispatcher) = wired();
    let app = build_test_app(Arc::clone(&gateway), test_config("/"));

    let requests: Vec<_> = (0..5)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(app, "/build").await.status() })
        })
        .collect();
    for request in requests {
        assert_eq!(request.await.unwrap(), StatusCode::ACCEPTED);
    }

    drop(app);
    drop(gateway);
    let summary = drain(dispatcher).await;
    assert_eq!(summary.runs, 1);
    assert_eq!(summary.succeeded, 1);
}

// ---------------------------------------------------------------------------
// Test: scripts discovered on disk are triggerable by file name
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scripts_directory_entries_become_triggers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("deploy.sh"), "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::write(dir.path().join("rotate-logs"), "#!/bin/sh\nexit 0\n").unwrap();

    let registry = ScriptRegistry::from_dir(dir.path()).unwrap();
    let config = test_config("/hooks/");
    let (gateway, _dispatcher) = dispatch::wire(&registry, ProcessRunner::new(config.runner));
    let gateway = Arc::new(gateway);
    let app = build_test_app(Arc::clone(&gateway), config);

    let response = send(app.clone(), Method::POST, "/hooks/deploy.sh").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(gateway.is_pending("deploy.sh"), Some(true));
    assert_eq!(gateway.is_pending("rotate-logs"), Some(false));

    let response = get(app, "/hooks/deploy").await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(gateway.is_pending("deploy"), None);
}

/// Run a dispatcher whose gateway has been dropped until its queues drain.
async fn drain(dispatcher: Dispatcher<ProcessRunner>) -> DispatchSummary {
    tokio::time::timeout(Duration::from_secs(5), dispatcher.run(CancellationToken::new()))
        .await
        .expect("dispatcher should drain and stop")
}

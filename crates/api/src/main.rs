//! `launchpad` -- run scripts from a directory over HTTP.
//!
//! Every entry in `DIR` is exposed at `<prefix><name>`. A request queues one
//! run of that script (collapsing with any run already queued) and is
//! answered `202 Accepted` immediately. Queued runs execute one at a time.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchpad_api::config::{Cli, LogFormat, ServerConfig};
use launchpad_api::router::build_app_router;
use launchpad_api::state::AppState;
use launchpad_core::dispatch;
use launchpad_core::registry::ScriptRegistry;
use launchpad_core::scripting::ProcessRunner;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %format!("{e:#}"), "Fatal error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // --- Configuration ---
    let config = ServerConfig::from_cli(cli).context("Invalid configuration")?;
    tracing::info!(
        dir = %config.scripts_dir.display(),
        addr = %config.listen_addr,
        prefix = %config.trigger_prefix,
        timeout_ms = config.runner.run_timeout.as_millis() as u64,
        grace_ms = config.runner.grace_timeout.as_millis() as u64,
        "Loaded configuration",
    );

    // --- Scripts ---
    let registry = ScriptRegistry::from_dir(&config.scripts_dir).context("Error finding scripts")?;
    for key in registry.keys() {
        tracing::debug!(key, "Registered script");
    }
    tracing::info!(scripts = registry.len(), "Scripts registered");

    // --- Dispatcher ---
    let (gateway, dispatcher) = dispatch::wire(&registry, ProcessRunner::new(config.runner));
    let cancel = CancellationToken::new();
    let mut dispatcher_handle = tokio::spawn(dispatcher.run(cancel.clone()));

    // --- Router ---
    let state = AppState {
        gateway: Arc::new(gateway),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state);

    // --- Start server ---
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, stopping dispatcher");
    cancel.cancel();

    match tokio::time::timeout(config.shutdown_timeout, &mut dispatcher_handle).await {
        Ok(Ok(summary)) => {
            tracing::info!(
                runs = summary.runs,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Dispatcher stopped",
            );
        }
        Ok(Err(e)) => tracing::error!(error = %e, "Dispatcher task failed"),
        Err(_) => {
            tracing::warn!(
                timeout_ms = config.shutdown_timeout.as_millis() as u64,
                "Script still running at shutdown, abandoning it",
            );
            // Dropping the in-flight run kills the script's process group.
            dispatcher_handle.abort();
            let _ = dispatcher_handle.await;
        }
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "launchpad=info,launchpad_api=info,launchpad_core=info,tower_http=info".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

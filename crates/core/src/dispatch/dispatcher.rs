//! Serial dispatcher over every debounce queue.
//!
//! All receivers live in one [`StreamMap`], which waits on the whole set at
//! once and starts each poll at a pseudo-random queue, so no ready key can
//! be starved and no FIFO order across keys is implied. Exactly one request
//! is taken per iteration and handed to the runner; the next request is not
//! taken until that run has finished. A slow script therefore delays every
//! other script.

use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{StreamExt, StreamMap};
use tokio_util::sync::CancellationToken;

use super::RunRequest;
use crate::scripting::{RunError, Runner};

/// Counters returned when the dispatcher stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub runs: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Drains the debounce queues into a [`Runner`], one run at a time.
pub struct Dispatcher<R> {
    queues: StreamMap<String, ReceiverStream<RunRequest>>,
    runner: R,
}

impl<R: Runner> Dispatcher<R> {
    pub(crate) fn new(queues: StreamMap<String, ReceiverStream<RunRequest>>, runner: R) -> Self {
        Self { queues, runner }
    }

    /// Number of queues still open.
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    /// Run until `cancel` fires or every queue has closed.
    ///
    /// Cancellation is only observed between runs; an in-flight run always
    /// completes (or hits its own deadlines) first.
    pub async fn run(mut self, cancel: CancellationToken) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        if self.queues.is_empty() {
            tracing::warn!("No scripts registered, dispatcher idle until shutdown");
            cancel.cancelled().await;
            return summary;
        }

        tracing::info!(queues = self.queues.len(), "Dispatcher started");

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatcher shutting down");
                    break;
                }
                next = self.queues.next() => next,
            };

            let Some((_, request)) = next else {
                tracing::info!("All debounce queues closed, dispatcher stopping");
                break;
            };

            summary.runs += 1;
            if self.dispatch(&request).await {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        tracing::info!(
            runs = summary.runs,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Dispatcher stopped",
        );
        summary
    }

    /// Execute one request. Returns `true` on success.
    async fn dispatch(&self, request: &RunRequest) -> bool {
        tracing::info!(
            key = %request.key,
            command = %request.command,
            "Got request, executing script",
        );

        match self.runner.run(&request.command).await {
            Ok(report) => {
                tracing::info!(
                    key = %request.key,
                    duration_ms = report.duration_ms,
                    "Script completed",
                );
                true
            }
            Err(err) => {
                log_failure(&request.key, &err);
                false
            }
        }
    }
}

/// Forced kills are the most severe class; plain non-zero exits the least.
fn log_failure(key: &str, err: &RunError) {
    match err {
        RunError::Killed { .. } => {
            tracing::error!(key, error = %err, "Script ignored interrupt and was killed");
        }
        RunError::TimedOut { .. } => {
            tracing::error!(key, error = %err, "Script timed out");
        }
        RunError::Start { .. } | RunError::Wait(_) => {
            tracing::error!(key, error = %err, "Script could not be run");
        }
        RunError::NonZeroExit { .. } | RunError::Signaled { .. } => {
            tracing::warn!(key, error = %err, "Script failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

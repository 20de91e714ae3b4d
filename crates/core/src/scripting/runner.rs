//! Process runner with a two-stage deadline.
//!
//! [`ProcessRunner`] starts one command and waits up to `run_timeout` for it
//! to exit. On expiry it interrupts the child's process group and waits up
//! to `grace_timeout` more; if the group is still alive after that it is
//! killed outright. Every path ends in exactly one [`RunReport`] or
//! [`RunError`], which the caller logs. Nothing is propagated further.

use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Child;

use super::command::CommandSpec;

/// Default wall-clock limit before a run is interrupted.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default time between the interrupt and the forced kill.
pub const DEFAULT_GRACE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadlines applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Measured from process start.
    pub run_timeout: Duration,
    /// Measured from the moment the interrupt is sent.
    pub grace_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            run_timeout: DEFAULT_RUN_TIMEOUT,
            grace_timeout: DEFAULT_GRACE_TIMEOUT,
        }
    }
}

/// A run that exited with status 0 before the run timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Every way a run can fail.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The OS refused to create the process (missing binary, permissions).
    #[error("Failed to start {program}: {source}")]
    Start {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran to completion but reported failure.
    #[error("Exited with code {exit_code} after {duration_ms}ms")]
    NonZeroExit { exit_code: i32, duration_ms: u64 },

    /// The process was terminated by a signal nobody in this runner sent.
    #[error("Terminated by signal {signal} after {duration_ms}ms")]
    Signaled { signal: i32, duration_ms: u64 },

    /// The run timeout expired and the process exited after the interrupt.
    /// Still a failure, even when the exit itself was clean.
    #[error("Timed out after {timeout_ms}ms; exited {elapsed_ms}ms after start following interrupt")]
    TimedOut { timeout_ms: u64, elapsed_ms: u64 },

    /// The process outlived the grace period and was killed.
    #[error("Ignored interrupt; killed {elapsed_ms}ms after start")]
    Killed { elapsed_ms: u64 },

    /// Waiting on the child failed at the OS level.
    #[error("Failed waiting for process: {0}")]
    Wait(#[from] std::io::Error),
}

impl RunError {
    /// Whether the runner had to step in (interrupt or kill).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::Killed { .. })
    }
}

/// Executes one command to completion or forced termination.
///
/// The dispatcher is generic over this trait so its scheduling can be
/// exercised without spawning real processes.
pub trait Runner: Send + Sync {
    fn run(
        &self,
        command: &CommandSpec,
    ) -> impl Future<Output = Result<RunReport, RunError>> + Send;
}

/// [`Runner`] backed by real OS processes.
///
/// The child gets no stdin and inherits the server's stdout/stderr. On Unix
/// it leads its own process group, so interrupt and kill also reach any
/// processes the script forks.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

impl Runner for ProcessRunner {
    async fn run(&self, command: &CommandSpec) -> Result<RunReport, RunError> {
        let start = Instant::now();
        let mut child = spawn(command)?;
        let pid = child.id();
        let mut group = GroupGuard::new(pid);
        tracing::debug!(pid, command = %command, "Process started");

        // Stage 1: natural completion or run timeout.
        if let Ok(status) = tokio::time::timeout(self.config.run_timeout, child.wait()).await {
            group.disarm();
            return classify_exit(status?, elapsed_ms(start));
        }

        tracing::warn!(
            pid,
            command = %command,
            timeout_ms = duration_ms(self.config.run_timeout),
            "Run timeout reached, interrupting process",
        );
        send_signal(&mut child, pid, Signal::Interrupt);

        // Stage 2: cooperative exit or grace timeout.
        if let Ok(status) = tokio::time::timeout(self.config.grace_timeout, child.wait()).await {
            group.disarm();
            let status = status?;
            tracing::info!(pid, %status, "Process exited during grace period");
            return Err(RunError::TimedOut {
                timeout_ms: duration_ms(self.config.run_timeout),
                elapsed_ms: elapsed_ms(start),
            });
        }

        tracing::warn!(
            pid,
            command = %command,
            grace_ms = duration_ms(self.config.grace_timeout),
            "Grace period expired, killing process",
        );
        send_signal(&mut child, pid, Signal::Kill);
        group.disarm();
        let elapsed_ms = elapsed_ms(start);

        // Reaping is best effort; the late status is logged and discarded.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::debug!(pid, %status, "Reaped killed process"),
                Err(e) => tracing::debug!(pid, error = %e, "Failed to reap killed process"),
            }
        });

        Err(RunError::Killed { elapsed_ms })
    }
}

/// Kills the child's whole process group if the run future is dropped while
/// the child is still running (e.g. the dispatcher is aborted at shutdown).
///
/// `kill_on_drop` only reaches the group leader; this reaches the processes
/// the script forked as well.
struct GroupGuard {
    pid: Option<u32>,
}

impl GroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        let Some(pid) = self.pid.take() else {
            return;
        };
        tracing::warn!(pid, "Run abandoned, killing process group");
        if let Err(e) = signal_group(pid, Signal::Kill) {
            tracing::debug!(pid, error = %e, "Failed to kill abandoned process group");
        }
    }
}

fn spawn(command: &CommandSpec) -> Result<Child, RunError> {
    let mut cmd = command.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|source| RunError::Start {
        program: command.program().display().to_string(),
        source,
    })
}

fn classify_exit(status: ExitStatus, duration_ms: u64) -> Result<RunReport, RunError> {
    if status.success() {
        return Ok(RunReport { duration_ms });
    }
    match status.code() {
        Some(exit_code) => Err(RunError::NonZeroExit {
            exit_code,
            duration_ms,
        }),
        None => Err(RunError::Signaled {
            signal: exit_signal(&status),
            duration_ms,
        }),
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> i32 {
    -1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Interrupt,
    Kill,
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: Signal) -> std::io::Result<()> {
    let signo = match signal {
        Signal::Interrupt => libc::SIGINT,
        Signal::Kill => libc::SIGKILL,
    };
    let pgid = libc::pid_t::try_from(pid)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // SAFETY: kill(2) takes plain integers and has no memory-safety
    // preconditions. A negative pid addresses the process group the child
    // leads (it was spawned with `process_group(0)`).
    let ret = unsafe { libc::kill(-pgid, signo) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn signal_group(_pid: u32, _signal: Signal) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "process groups are not supported on this platform",
    ))
}

fn send_signal(child: &mut Child, pid: Option<u32>, signal: Signal) {
    if let Some(pid) = pid {
        match signal_group(pid, signal) {
            Ok(()) => return,
            Err(e) => tracing::debug!(pid, ?signal, error = %e, "Failed to signal process group"),
        }
    }

    // Without a group there is no cooperative interrupt; the grace period
    // simply runs out.
    if signal == Signal::Kill {
        if let Err(e) = child.start_kill() {
            tracing::debug!(error = %e, "Failed to kill process");
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn elapsed_ms(start: Instant) -> u64 {
    duration_ms(start.elapsed())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

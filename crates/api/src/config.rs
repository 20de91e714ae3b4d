use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use launchpad_core::duration::parse_duration;
use launchpad_core::scripting::RunnerConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Run the scripts in a directory when their URL is requested.
///
/// Every option can also be set through the environment variable named in
/// its help text, including from a `.env` file in the working directory.
#[derive(Debug, Parser)]
#[command(name = "launchpad", version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the scripts to expose. Each entry name becomes
    /// a trigger path.
    #[arg(value_name = "DIR")]
    pub scripts_dir: PathBuf,

    /// HTTP listen address. A bare `:port` listens on all interfaces.
    #[arg(long, env = "LAUNCHPAD_ADDR", default_value = ":8888")]
    pub addr: String,

    /// URL path prefix under which scripts are triggered.
    #[arg(long, env = "LAUNCHPAD_PATH", default_value = "/")]
    pub path: String,

    /// Maximum time a script can run before it is interrupted.
    #[arg(long, env = "LAUNCHPAD_TIMEOUT", default_value = "15m", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Time an interrupted script gets to exit before it is killed.
    #[arg(long, env = "LAUNCHPAD_GRACE", default_value = "5s", value_parser = parse_duration)]
    pub grace: Duration,

    /// How long shutdown waits for a script that is still running.
    #[arg(
        long,
        env = "LAUNCHPAD_SHUTDOWN_TIMEOUT",
        default_value = "30s",
        value_parser = parse_duration
    )]
    pub shutdown_timeout: Duration,

    /// Log output format.
    #[arg(long, env = "LAUNCHPAD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Invalid values that clap cannot reject on its own.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}': expected host:port or :port")]
    InvalidAddr(String),

    #[error("Trigger path prefix must start with '/', got '{0}'")]
    InvalidPrefix(String),
}

/// Resolved server configuration, passed explicitly to everything that
/// needs it.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory the script registry is built from.
    pub scripts_dir: PathBuf,
    /// `host:port` to bind.
    pub listen_addr: String,
    /// Path prefix, always beginning and ending with `/`.
    pub trigger_prefix: String,
    /// Run and grace deadlines for every script.
    pub runner: RunnerConfig,
    /// Wait for an in-flight run during shutdown.
    pub shutdown_timeout: Duration,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: normalize_listen_addr(&cli.addr)?,
            trigger_prefix: normalize_prefix(&cli.path)?,
            scripts_dir: cli.scripts_dir,
            runner: RunnerConfig {
                run_timeout: cli.timeout,
                grace_timeout: cli.grace,
            },
            shutdown_timeout: cli.shutdown_timeout,
            log_format: cli.log_format,
        })
    }
}

/// Turn `:8888` into `0.0.0.0:8888`; leave `host:port` untouched.
pub fn normalize_listen_addr(addr: &str) -> Result<String, ConfigError> {
    let addr = addr.trim();
    let invalid = || ConfigError::InvalidAddr(addr.to_string());

    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    port.parse::<u16>().map_err(|_| invalid())?;

    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok(format!("{host}:{port}"))
}

/// Ensure the prefix starts and ends with `/`.
pub fn normalize_prefix(prefix: &str) -> Result<String, ConfigError> {
    let prefix = prefix.trim();
    if !prefix.starts_with('/') {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    if prefix.ends_with('/') {
        Ok(prefix.to_string())
    } else {
        Ok(format!("{prefix}/"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

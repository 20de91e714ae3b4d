//! Script execution: what to run ([`command`]) and how to run it under a
//! two-stage deadline ([`runner`]).

pub mod command;
pub mod runner;

pub use command::CommandSpec;
pub use runner::{ProcessRunner, RunError, RunReport, Runner, RunnerConfig};

//! Launchpad domain logic.
//!
//! Everything between an inbound trigger and a finished OS process lives
//! here, free of any HTTP concerns:
//!
//! - [`registry`] — script discovery and the immutable key → command map.
//! - [`dispatch`] — per-script debounce queues, the trigger gateway, and
//!   the serial dispatcher that multiplexes them.
//! - [`scripting`] — command specifications and the two-stage-timeout
//!   process runner.

pub mod dispatch;
pub mod duration;
pub mod error;
pub mod registry;
pub mod scripting;

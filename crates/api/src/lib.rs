//! Launchpad HTTP server library.
//!
//! Exposes configuration, shared state, and the router so integration tests
//! and the `launchpad` binary build the exact same application.

pub mod config;
pub mod router;
pub mod routes;
pub mod state;

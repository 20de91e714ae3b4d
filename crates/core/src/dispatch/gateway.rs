//! Trigger gateway: key → non-blocking offer.
//!
//! The gateway never reports anything back to the caller beyond a
//! [`TriggerOutcome`] used for logging. Unknown keys and full queues are
//! both silently dropped; callers are always acknowledged the same way.

use std::collections::HashMap;

use super::debounce::{DebounceQueue, Offer};
use super::RunRequest;

/// What happened to one trigger. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A run is now pending for the key.
    Queued,
    /// A run was already pending; this trigger added nothing.
    AlreadyPending,
    /// No script is registered under the key.
    UnknownKey,
    /// The dispatcher is gone (shutting down).
    Closed,
}

impl TriggerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::AlreadyPending => "already_pending",
            Self::UnknownKey => "unknown_key",
            Self::Closed => "closed",
        }
    }
}

/// Maps trigger keys to their debounce queues.
///
/// Built by [`wire`](super::wire); shared by every HTTP handler behind an
/// `Arc`. All methods take `&self` and never block.
#[derive(Debug)]
pub struct TriggerGateway {
    triggers: HashMap<String, (DebounceQueue, RunRequest)>,
}

impl TriggerGateway {
    pub(crate) fn new(triggers: HashMap<String, (DebounceQueue, RunRequest)>) -> Self {
        Self { triggers }
    }

    /// Offer a run of the script registered under `key`.
    pub fn trigger(&self, key: &str) -> TriggerOutcome {
        let Some((queue, request)) = self.triggers.get(key) else {
            return TriggerOutcome::UnknownKey;
        };
        match queue.offer(request.clone()) {
            Offer::Queued => TriggerOutcome::Queued,
            Offer::AlreadyPending => TriggerOutcome::AlreadyPending,
            Offer::Closed => TriggerOutcome::Closed,
        }
    }

    /// `None` for unknown keys.
    pub fn is_pending(&self, key: &str) -> Option<bool> {
        self.triggers.get(key).map(|(queue, _)| queue.is_pending())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.triggers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

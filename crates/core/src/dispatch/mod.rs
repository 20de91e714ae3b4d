//! Trigger → queue → dispatcher plumbing.
//!
//! One capacity-1 [`debounce`] queue exists per registered script. The
//! [`gateway`] offers run requests into those queues without ever blocking,
//! and a single [`dispatcher`] drains them one at a time into a
//! [`Runner`](crate::scripting::Runner). [`wire`] builds all three from a
//! registry so the one-queue-per-key invariant holds by construction.

pub mod debounce;
pub mod dispatcher;
pub mod gateway;

use std::collections::HashMap;
use std::sync::Arc;

use tokio_stream::StreamMap;

use crate::registry::ScriptRegistry;
use crate::scripting::{CommandSpec, Runner};

pub use debounce::{debounce_queue, DebounceQueue, DebounceReceiver, Offer, DEBOUNCE_CAPACITY};
pub use dispatcher::{DispatchSummary, Dispatcher};
pub use gateway::{TriggerGateway, TriggerOutcome};

/// A pending intent to run one script. Carries no caller context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub key: Arc<str>,
    pub command: Arc<CommandSpec>,
}

/// Create one debounce queue per registry key and return the gateway that
/// feeds them along with the dispatcher that drains them.
pub fn wire<R: Runner>(registry: &ScriptRegistry, runner: R) -> (TriggerGateway, Dispatcher<R>) {
    let mut triggers = HashMap::with_capacity(registry.len());
    let mut receivers = StreamMap::with_capacity(registry.len());

    for (key, command) in registry.iter() {
        let (queue, receiver) = debounce_queue();
        let request = RunRequest {
            key: Arc::from(key),
            command: Arc::new(command.clone()),
        };
        triggers.insert(key.to_string(), (queue, request));
        receivers.insert(key.to_string(), receiver.into_stream());
    }

    tracing::debug!(queues = triggers.len(), "Debounce queues created");
    (TriggerGateway::new(triggers), Dispatcher::new(receivers, runner))
}

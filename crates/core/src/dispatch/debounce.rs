//! Single-slot debounce queue.
//!
//! A bounded channel of capacity exactly one. [`DebounceQueue::offer`]
//! succeeds only when the slot is empty, so any burst of triggers that
//! arrives before the dispatcher takes the pending request collapses into
//! that one request. A larger capacity would turn debouncing into a backlog.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio_stream::wrappers::ReceiverStream;

use super::RunRequest;

/// Slot count of every debounce queue. Must stay at one.
pub const DEBOUNCE_CAPACITY: usize = 1;

/// Result of a non-blocking offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The slot was empty and now holds the request.
    Queued,
    /// A run is already pending; the request was absorbed.
    AlreadyPending,
    /// The receiving side is gone (dispatcher stopped).
    Closed,
}

/// Producer half, held by the gateway.
#[derive(Debug, Clone)]
pub struct DebounceQueue {
    tx: mpsc::Sender<RunRequest>,
}

/// Consumer half, held by the dispatcher.
#[derive(Debug)]
pub struct DebounceReceiver {
    rx: mpsc::Receiver<RunRequest>,
}

pub fn debounce_queue() -> (DebounceQueue, DebounceReceiver) {
    let (tx, rx) = mpsc::channel(DEBOUNCE_CAPACITY);
    (DebounceQueue { tx }, DebounceReceiver { rx })
}

impl DebounceQueue {
    /// Try to fill the slot. Never blocks.
    pub fn offer(&self, request: RunRequest) -> Offer {
        match self.tx.try_send(request) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(_)) => Offer::AlreadyPending,
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Whether a request is waiting in the slot.
    pub fn is_pending(&self) -> bool {
        !self.tx.is_closed() && self.tx.capacity() == 0
    }
}

impl DebounceReceiver {
    /// Wait for the pending request. `None` once every producer is dropped
    /// and the slot is empty.
    pub async fn take(&mut self) -> Option<RunRequest> {
        self.rx.recv().await
    }

    /// Take the pending request if there is one.
    pub fn try_take(&mut self) -> Option<RunRequest> {
        match self.rx.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn into_stream(self) -> ReceiverStream<RunRequest> {
        ReceiverStream::new(self.rx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scripting::CommandSpec;

    fn request(key: &str) -> RunRequest {
        RunRequest {
            key: Arc::from(key),
            command: Arc::new(CommandSpec::new(format!("/srv/hooks/{key}"))),
        }
    }

    #[test]
    fn burst_collapses_into_one_pending_request() {
        let (queue, mut receiver) = debounce_queue();

        assert_eq!(queue.offer(request("build")), Offer::Queued);
        for _ in 0..9 {
            assert_eq!(queue.offer(request("build")), Offer::AlreadyPending);
        }
        assert!(queue.is_pending());

        assert_eq!(receiver.try_take(), Some(request("build")));
        assert_eq!(receiver.try_take(), None);
        assert!(!queue.is_pending());
    }

    #[test]
    fn slot_refills_after_take() {
        let (queue, mut receiver) = debounce_queue();

        assert_eq!(queue.offer(request("build")), Offer::Queued);
        assert!(receiver.try_take().is_some());
        assert_eq!(queue.offer(request("build")), Offer::Queued);
        assert_eq!(queue.offer(request("build")), Offer::AlreadyPending);
        assert!(receiver.try_take().is_some());
        assert!(receiver.try_take().is_none());
    }

    #[test]
    fn offer_after_receiver_dropped_reports_closed() {
        let (queue, receiver) = debounce_queue();
        drop(receiver);
        assert_eq!(queue.offer(request("build")), Offer::Closed);
        assert!(!queue.is_pending());
    }

    #[tokio::test]
    async fn take_waits_for_offer() {
        let (queue, mut receiver) = debounce_queue();
        let waiter = tokio::spawn(async move { receiver.take().await });

        tokio::task::yield_now().await;
        assert_eq!(queue.offer(request("deploy")), Offer::Queued);

        let taken = waiter.await.expect("join");
        assert_eq!(taken, Some(request("deploy")));
    }

    #[tokio::test]
    async fn take_returns_none_when_retired() {
        let (queue, mut receiver) = debounce_queue();
        drop(queue);
        assert_eq!(receiver.take().await, None);
    }

    #[tokio::test]
    async fn pending_request_survives_producer_drop() {
        let (queue, mut receiver) = debounce_queue();
        assert_eq!(queue.offer(request("build")), Offer::Queued);
        drop(queue);
        assert_eq!(receiver.take().await, Some(request("build")));
        assert_eq!(receiver.take().await, None);
    }
}

//! Event-task lifetime tracking.
//!
//! Every lifecycle event (install, activate, fetch interception) runs as a
//! tracked task, so a handler outlives its triggering connection: clients
//! may disconnect mid-request, but a store that started always finishes.
//! Shutdown drains the tracker rather than cutting writes off.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Tracks in-flight event handlers so the process only exits after they
/// settle.
#[derive(Clone, Default)]
pub struct EventTracker {
    tracker: TaskTracker,
}

impl EventTracker {
    pub fn new() -> Self {
        Self { tracker: TaskTracker::new() }
    }

    /// Run an event handler as a tracked task.
    ///
    /// The task runs to completion even if the returned handle is dropped.
    pub fn dispatch<F>(&self, event: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(event)
    }

    /// Stop waiting for new events and let in-flight ones settle.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_dispatch_returns_handler_output() {
        let events = EventTracker::new();
        let result = events.dispatch(async { 40 + 2 }).await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn test_drain_waits_for_all_events() {
        let events = EventTracker::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let counter = counter.clone();
            events.dispatch(async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        events.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn test_event_outlives_dropped_handle() {
        let events = EventTracker::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let task_counter = counter.clone();

        drop(events.dispatch(async move {
            tokio::task::yield_now().await;
            task_counter.fetch_add(1, Ordering::SeqCst);
        }));

        events.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

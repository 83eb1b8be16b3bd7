//! # Subscriptions
//!
//! Receiving side of the bus. Filtering happens here, per subscriber: the
//! broadcast channel delivers every event to every receiver and each one
//! drops what its filter does not match.
//!
//! A subscriber that falls more than the channel capacity behind loses the
//! oldest events. The loss is counted (`missed`) so an observer knows to
//! re-read the stores instead of trusting its incremental view.

use crate::events::{EventFilter, SyncEvent};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every sender is gone; no further events will arrive.
    #[error("Event bus closed")]
    Closed,
}

/// Source of filtered subscriptions.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// Pull-style handle on the bus.
pub struct Subscription {
    receiver: broadcast::Receiver<SyncEvent>,
    filter: EventFilter,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<SyncEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            missed: 0,
        }
    }

    /// Wait for the next matching event. `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(count)) => self.note_lag(count),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<SyncEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(count)) => self.note_lag(count),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Events dropped because this subscriber lagged.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn note_lag(&mut self, count: u64) {
        self.missed += count;
        warn!(lagged = count, total = self.missed, "[bus] subscriber lagged, events dropped");
    }
}

/// `Stream` over a subscription, for use with stream combinators.
///
/// Built on `BroadcastStream`, so an idle stream parks until the next publish.
pub struct EventStream {
    inner: BroadcastStream<SyncEvent>,
    filter: EventFilter,
    missed: u64,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self {
            inner: BroadcastStream::new(subscription.receiver),
            filter: subscription.filter,
            missed: subscription.missed,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }
}

impl Stream for EventStream {
    type Item = SyncEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) if self.filter.matches(&event) => return Poll::Ready(Some(event)),
                Some(Ok(_)) => {}
                Some(Err(BroadcastStreamRecvError::Lagged(count))) => {
                    self.missed += count;
                    warn!(lagged = count, "[bus] event stream lagged, events dropped");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use crate::publisher::InMemoryEventBus;
    use crate::EventPublisher;
    use shared_types::{ContainerStatus, RouteStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Wake, Waker};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    fn updated(uid: &str) -> SyncEvent {
        SyncEvent::ContainerUpdated {
            uid: uid.to_string(),
            status: ContainerStatus::InStock,
            warehouse_id: None,
        }
    }

    fn route_completed() -> SyncEvent {
        SyncEvent::RouteProgressed {
            route_id: "R1".to_string(),
            status: RouteStatus::Completed,
            full_baskets_completed: true,
            loose_items_completed: true,
        }
    }

    #[derive(Default)]
    struct WakeCounter(AtomicUsize);

    impl Wake for WakeCounter {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_recv_skips_unmatched_topics() {
        let bus = InMemoryEventBus::new();
        let mut routes = bus.subscribe(EventFilter::topics(vec![EventTopic::Routes]));

        bus.publish(updated("X1")).await;
        bus.publish(route_completed()).await;

        let received = timeout(Duration::from_millis(100), routes.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert_eq!(received, route_completed());
    }

    #[tokio::test]
    async fn test_try_recv_by_key() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::keys(vec!["X2".to_string()]));
        assert_eq!(sub.try_recv(), Ok(None));

        bus.publish(updated("X1")).await;
        bus.publish(updated("X2")).await;

        assert_eq!(sub.try_recv(), Ok(Some(updated("X2"))));
        assert_eq!(sub.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_closed_bus_ends_subscription() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());
        drop(bus);

        assert_eq!(sub.recv().await, None);
        assert_eq!(sub.try_recv(), Err(SubscriptionError::Closed));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_counts_missed_events() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut sub = bus.subscribe(EventFilter::all());

        for uid in ["X1", "X2", "X3", "X4"] {
            bus.publish(updated(uid)).await;
        }

        assert_eq!(sub.try_recv(), Ok(Some(updated("X3"))));
        assert_eq!(sub.missed(), 2);
        assert_eq!(sub.try_recv(), Ok(Some(updated("X4"))));
    }

    #[tokio::test]
    async fn test_dropped_subscriptions_release_receivers() {
        let bus = InMemoryEventBus::new();
        {
            let _a = bus.subscribe(EventFilter::all());
            let _b = bus.event_stream(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_stream_parks_until_publish() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::all());
        let wakes = Arc::new(WakeCounter::default());
        let waker = Waker::from(Arc::clone(&wakes));
        let mut cx = Context::from_waker(&waker);

        for _ in 0..50 {
            assert!(Pin::new(&mut stream).poll_next(&mut cx).is_pending());
        }
        assert_eq!(wakes.0.load(Ordering::SeqCst), 0);

        bus.publish(updated("X1")).await;
        assert!(wakes.0.load(Ordering::SeqCst) >= 1);
        assert_eq!(
            Pin::new(&mut stream).poll_next(&mut cx),
            Poll::Ready(Some(updated("X1")))
        );
    }

    #[tokio::test]
    async fn test_stream_filters_and_ends_with_bus() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::topics(vec![EventTopic::Routes]));
        assert_eq!(EventStream::filter(&stream).topics, vec![EventTopic::Routes]);

        bus.publish(updated("X1")).await;
        bus.publish(route_completed()).await;
        drop(bus);

        let received = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout");
        assert_eq!(received, Some(route_completed()));
        assert_eq!(stream.next().await, None);
    }
}

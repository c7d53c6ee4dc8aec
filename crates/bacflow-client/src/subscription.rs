//! Range-scoped fan-out of unconfirmed broadcast replies.
//!
//! A discovery caller subscribes to a key range, then collects whatever the
//! dispatcher publishes into that range until the overall or inactivity
//! deadline passes. Publishing never waits on a subscriber: each one has a
//! bounded buffer and a full buffer drops the value for that subscriber only.

use bacflow_core::services::i_am::IAmRequest;
use bacflow_core::services::who_is::WhoIsRequest;
use bacflow_core::types::Address;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{timeout_at, Instant};

/// An inclusive key range. A negative bound matches every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub start: i64,
    pub end: i64,
}

impl KeyRange {
    pub const ALL: Self = Self { start: -1, end: -1 };

    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, key: u32) -> bool {
        if self.start < 0 || self.end < 0 {
            return true;
        }
        (self.start..=self.end).contains(&i64::from(key))
    }
}

impl From<Option<(u32, u32)>> for KeyRange {
    fn from(range: Option<(u32, u32)>) -> Self {
        match range {
            Some((low, high)) => Self::new(i64::from(low), i64::from(high)),
            None => Self::ALL,
        }
    }
}

/// A decoded unconfirmed request worth correlating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastEvent {
    IAm { source: Address, i_am: IAmRequest },
    WhoIs { source: Address, request: WhoIsRequest },
}

impl BroadcastEvent {
    /// The key a subscription range is matched against.
    pub fn key(&self) -> u32 {
        match self {
            Self::IAm { i_am, .. } => i_am.device_id.instance(),
            Self::WhoIs { request, .. } => request.low_limit.unwrap_or(0),
        }
    }

    pub fn source(&self) -> &Address {
        match self {
            Self::IAm { source, .. } | Self::WhoIs { source, .. } => source,
        }
    }
}

#[derive(Debug)]
struct Subscriber {
    id: u64,
    range: KeyRange,
    tx: mpsc::Sender<BroadcastEvent>,
}

#[derive(Debug)]
pub struct SubscriptionManager {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl SubscriptionManager {
    /// `buffer` is the per-subscriber queue depth (at least 1).
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(
        self: &Arc<Self>,
        range: KeyRange,
        overall: Duration,
        idle: Duration,
    ) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers().push(Subscriber { id, range, tx });
        Subscription {
            manager: Arc::clone(self),
            id,
            rx,
            started: Instant::now(),
            overall,
            idle,
        }
    }

    /// Offers `event` to every live subscription whose range holds `key`.
    ///
    /// Returns how many subscriptions accepted it.
    pub fn publish(&self, key: u32, event: BroadcastEvent) -> usize {
        let subscribers = self.subscribers();
        let mut delivered = 0;
        for sub in subscribers.iter().filter(|s| s.range.contains(key)) {
            match sub.tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::debug!("subscription {} is full; dropping event for key {key}", sub.id)
                }
                Err(TrySendError::Closed(_)) => {
                    log::trace!("subscription {} already finished", sub.id)
                }
            }
        }
        delivered
    }

    fn remove(&self, id: u64) {
        let mut subscribers = self.subscribers();
        if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
            subscribers.swap_remove(pos);
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscribers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live subscription; removed from its manager when collected or dropped.
#[derive(Debug)]
pub struct Subscription {
    manager: Arc<SubscriptionManager>,
    id: u64,
    rx: mpsc::Receiver<BroadcastEvent>,
    started: Instant,
    overall: Duration,
    idle: Duration,
}

impl Subscription {
    /// Gathers events until `overall` has passed since subscribing or `idle`
    /// has passed without a new event, whichever comes first.
    pub async fn collect(mut self) -> Vec<BroadcastEvent> {
        let overall_deadline = self.started + self.overall;
        let mut events = Vec::new();
        loop {
            let deadline = overall_deadline.min(Instant::now() + self.idle);
            match timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) | Err(_) => break,
            }
        }

        self.manager.remove(self.id);
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.manager.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::{BroadcastEvent, KeyRange, SubscriptionManager};
    use bacflow_core::services::i_am::IAmRequest;
    use bacflow_core::types::{Address, ObjectId, Segmentation};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn i_am(instance: u32) -> BroadcastEvent {
        BroadcastEvent::IAm {
            source: Address::from_station(instance as u8),
            i_am: IAmRequest {
                device_id: ObjectId::device(instance).unwrap(),
                max_apdu: 1476,
                segmentation: Segmentation::NoSegmentation,
                vendor_id: 7,
            },
        }
    }

    fn publish(manager: &SubscriptionManager, instance: u32) -> usize {
        let event = i_am(instance);
        manager.publish(event.key(), event)
    }

    #[test]
    fn negative_bounds_match_everything() {
        assert!(KeyRange::ALL.contains(0));
        assert!(KeyRange::ALL.contains(0x3F_FFFF));
        assert!(KeyRange::new(-1, 10).contains(500));
        let range = KeyRange::from(Some((10, 20)));
        assert!(range.contains(10) && range.contains(20));
        assert!(!range.contains(9) && !range.contains(21));
    }

    #[tokio::test(start_paused = true)]
    async fn publish_respects_ranges() {
        let manager = Arc::new(SubscriptionManager::new(8));
        let sub = manager.subscribe(
            KeyRange::new(0, 100),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        assert_eq!(publish(&manager, 50), 1);
        assert_eq!(publish(&manager, 101), 0);

        let events = sub.collect().await;
        assert_eq!(events, vec![i_am(50)]);
        assert!(manager.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_subscriptions_both_receive() {
        let manager = Arc::new(SubscriptionManager::new(8));
        let a = manager.subscribe(
            KeyRange::new(0, 100),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        let b = manager.subscribe(
            KeyRange::new(50, 200),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );
        assert_eq!(publish(&manager, 75), 2);
        assert_eq!(publish(&manager, 150), 1);

        assert_eq!(a.collect().await, vec![i_am(75)]);
        assert_eq!(b.collect().await, vec![i_am(75), i_am(150)]);
        assert_eq!(manager.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn collect_stops_after_idle_gap() {
        let manager = Arc::new(SubscriptionManager::new(8));
        let sub = manager.subscribe(KeyRange::ALL, Duration::from_secs(60), Duration::from_secs(2));
        let start = Instant::now();

        let publisher = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                for instance in 1..=3 {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    publish(&manager, instance);
                }
            })
        };

        let events = sub.collect().await;
        publisher.await.unwrap();
        assert_eq!(events.len(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn collect_stops_at_overall_deadline() {
        let manager = Arc::new(SubscriptionManager::new(64));
        let sub = manager.subscribe(KeyRange::ALL, Duration::from_secs(3), Duration::from_secs(2));
        let start = Instant::now();

        let publisher = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                for instance in 1..=10 {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    publish(&manager, instance);
                }
            })
        };

        let events = sub.collect().await;
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(events.len() <= 3);
        publisher.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn full_buffer_drops_for_that_subscriber_only() {
        let manager = Arc::new(SubscriptionManager::new(1));
        let full =
            manager.subscribe(KeyRange::ALL, Duration::from_secs(5), Duration::from_secs(1));
        let other = manager.subscribe(
            KeyRange::new(50, 60),
            Duration::from_secs(5),
            Duration::from_secs(1),
        );
        assert_eq!(publish(&manager, 1), 1);
        assert_eq!(publish(&manager, 2), 0);
        assert_eq!(publish(&manager, 55), 1);
        assert_eq!(publish(&manager, 56), 0);
        assert_eq!(full.collect().await, vec![i_am(1)]);
        assert_eq!(other.collect().await, vec![i_am(55)]);
    }

    #[tokio::test]
    async fn dropping_removes_subscription() {
        let manager = Arc::new(SubscriptionManager::new(4));
        let a = manager.subscribe(KeyRange::ALL, Duration::from_secs(1), Duration::from_secs(1));
        let b = manager.subscribe(KeyRange::ALL, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(manager.len(), 2);
        drop(a);
        assert_eq!(manager.len(), 1);
        assert_eq!(publish(&manager, 9), 1);
        drop(b);
        assert!(manager.is_empty());
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic bounded broadcast: one producer, many independent per-listener
//! queues. Used by the filesystem watcher (`create`/`modify`/`remove`/
//! `rename` events) and by the debugger client (pause/script event
//! families) — anywhere the spec calls for "a bounded ring per subscriber
//! with an overflow-drop-oldest policy".

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;

/// What happens when a receiver's queue is full and a new event arrives.
///
/// Only `DropOldest` is implemented — the spec only specifies this one
/// policy — but it's named explicitly so a future `DropNewest` or
/// `Block` variant doesn't require renaming the type callers hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    DropOldest,
}

struct ReceiverInner<T> {
    queue: Mutex<VecDeque<T>>,
    capacity: usize,
    notify: Notify,
    overflow_count: AtomicU64,
    closed: AtomicBool,
}

/// One guest listener's view of a broadcast family.
pub struct Receiver<T> {
    inner: Arc<ReceiverInner<T>>,
}

impl<T: Send + 'static> Receiver<T> {
    /// Await the next event, or `None` once the receiver is closed and
    /// drained.
    pub async fn recv(&self) -> Option<T> {
        loop {
            if let Some(v) = self.inner.queue.lock().pop_front() {
                return Some(v);
            }
            if self.inner.closed.load(Ordering::SeqCst) {
                return None;
            }
            let notified = self.inner.notify.notified();
            // Re-check after registering interest to avoid missing a publish
            // that happened between the first pop attempt and here.
            if let Some(v) = self.inner.queue.lock().pop_front() {
                return Some(v);
            }
            if self.inner.closed.load(Ordering::SeqCst) && self.inner.queue.lock().is_empty() {
                return None;
            }
            notified.await;
        }
    }

    /// Non-blocking poll: `Ok(Some(_))` a value, `Ok(None)` empty-but-open,
    /// `Err(())` closed-and-drained.
    pub fn try_recv(&self) -> Result<Option<T>, ()> {
        if let Some(v) = self.inner.queue.lock().pop_front() {
            return Ok(Some(v));
        }
        if self.inner.closed.load(Ordering::SeqCst) {
            Err(())
        } else {
            Ok(None)
        }
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Count of events dropped because this receiver's queue was full.
    pub fn overflow_count(&self) -> u64 {
        self.inner.overflow_count.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The producer side: holds only weak references to subscribers so a
/// guest dropping its receiver handle doesn't require the broadcaster to be
/// told explicitly.
pub struct Broadcaster<T> {
    subscribers: Mutex<Vec<Weak<ReceiverInner<T>>>>,
    default_capacity: usize,
}

impl<T: Clone + Send + 'static> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new(64)
    }
}

impl<T: Clone + Send + 'static> Broadcaster<T> {
    pub fn new(default_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            default_capacity,
        }
    }

    /// Register a new receiver with the broadcaster's default capacity.
    pub fn subscribe(&self) -> Receiver<T> {
        self.subscribe_with_capacity(self.default_capacity)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> Receiver<T> {
        let inner = Arc::new(ReceiverInner {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(256))),
            capacity,
            notify: Notify::new(),
            overflow_count: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });
        self.subscribers.lock().push(Arc::downgrade(&inner));
        Receiver { inner }
    }

    /// Fan out an event to every live subscriber. Dead (dropped) subscribers
    /// are pruned opportunistically.
    pub fn publish(&self, event: T) {
        let mut subs = self.subscribers.lock();
        subs.retain(|weak| weak.strong_count() > 0);
        for weak in subs.iter() {
            let Some(inner) = weak.upgrade() else { continue };
            if inner.closed.load(Ordering::SeqCst) {
                continue;
            }
            {
                let mut queue = inner.queue.lock();
                if queue.len() >= inner.capacity {
                    queue.pop_front();
                    inner.overflow_count.fetch_add(1, Ordering::SeqCst);
                }
                queue.push_back(event.clone());
            }
            inner.notify.notify_waiters();
        }
    }

    /// Close every live subscriber (used on session/watcher teardown).
    pub fn close_all(&self) {
        let subs = self.subscribers.lock();
        for weak in subs.iter() {
            if let Some(inner) = weak.upgrade() {
                inner.closed.store(true, Ordering::SeqCst);
                inner.notify.notify_waiters();
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subs = self.subscribers.lock();
        subs.retain(|weak| weak.strong_count() > 0);
        subs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_are_delivered_in_publish_order() {
        let bus: Broadcaster<u32> = Broadcaster::new(8);
        let rx = bus.subscribe();
        bus.publish(1);
        bus.publish(2);
        bus.publish(3);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts() {
        let bus: Broadcaster<u32> = Broadcaster::new(2);
        let rx = bus.subscribe_with_capacity(2);
        bus.publish(1);
        bus.publish(2);
        bus.publish(3); // should displace `1`
        assert_eq!(rx.overflow_count(), 1);
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test]
    async fn closed_receiver_drains_then_returns_none() {
        let bus: Broadcaster<u32> = Broadcaster::new(8);
        let rx = bus.subscribe();
        bus.publish(42);
        rx.close();
        assert_eq!(rx.recv().await, Some(42));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn multiple_receivers_each_get_every_event() {
        let bus: Broadcaster<u32> = Broadcaster::new(8);
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(7);
        assert_eq!(a.recv().await, Some(7));
        assert_eq!(b.recv().await, Some(7));
    }

    #[test]
    fn dropped_receivers_are_pruned_from_subscriber_count() {
        let bus: Broadcaster<u32> = Broadcaster::new(8);
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }
}

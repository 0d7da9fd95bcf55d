//! Event fan-out to connected SSE subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use toolbridge_core::BroadcastEvent;
use tracing::{debug, warn};

use super::connection::{ConnectionState, Frame, SendOutcome, SubscriberConnection};
use crate::metrics::{SSE_BROADCAST_DROPS_TOTAL, SSE_SUBSCRIBERS_ACTIVE};

/// Owns the live subscriber set.
///
/// The map lock is held for the whole of a `publish`, which serializes
/// publishers: every subscriber observes events in publish-call order. The
/// lock is never held across an `.await`; sends are `try_send`.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<String, Arc<SubscriberConnection>>>,
    buffer: usize,
    max_drops: u64,
}

impl BroadcastHub {
    /// Create a hub whose subscribers get `buffer`-deep queues and are
    /// disconnected after more than `max_drops` lost frames.
    pub fn new(buffer: usize, max_drops: u64) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
            max_drops,
        }
    }

    /// Register a new subscriber in the `Connecting` state.
    pub fn subscribe(&self) -> (Arc<SubscriberConnection>, mpsc::Receiver<Arc<Frame>>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let conn = Arc::new(SubscriberConnection::new(tx));
        let count = {
            let mut subs = self.subscribers.lock();
            let _ = subs.insert(conn.id.clone(), conn.clone());
            subs.len()
        };
        record_subscribers(count);
        debug!(conn_id = %conn.id, subscribers = count, "subscriber connected");
        (conn, rx)
    }

    /// Remove a subscriber and mark it closed. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: &str) {
        let (removed, count) = {
            let mut subs = self.subscribers.lock();
            let removed = subs.remove(id);
            (removed, subs.len())
        };
        if let Some(conn) = removed {
            conn.close();
            record_subscribers(count);
            debug!(
                conn_id = %id,
                subscribers = count,
                age_ms = conn.age().as_millis(),
                "subscriber disconnected"
            );
        }
    }

    /// Deliver `event` to every active subscriber. Returns the number of
    /// subscribers the frame was queued for.
    ///
    /// Never blocks and never fails: a full queue loses the frame, a closed
    /// queue removes the subscriber.
    pub fn publish(&self, event: &BroadcastEvent) -> usize {
        let frame = Arc::new(Frame::from_event(event));
        let mut delivered = 0;
        let mut subs = self.subscribers.lock();
        let mut evicted = Vec::new();

        for (id, conn) in subs.iter() {
            if conn.state() != ConnectionState::Active {
                continue;
            }
            match conn.send(frame.clone()) {
                SendOutcome::Delivered => delivered += 1,
                SendOutcome::Dropped => {
                    ::metrics::counter!(SSE_BROADCAST_DROPS_TOTAL).increment(1);
                    if conn.drop_count() > self.max_drops {
                        warn!(conn_id = %id, dropped = conn.drop_count(), "disconnecting slow subscriber");
                        evicted.push(id.clone());
                    }
                }
                SendOutcome::Closed => evicted.push(id.clone()),
            }
        }
        for id in &evicted {
            if let Some(conn) = subs.remove(id) {
                conn.close();
            }
        }
        let count = subs.len();
        drop(subs);

        if !evicted.is_empty() {
            record_subscribers(count);
        }
        debug!(event = event.kind.as_str(), recipients = delivered, "broadcast event");
        delivered
    }

    /// Lost frames a subscriber may accumulate before it is disconnected.
    pub fn max_drops(&self) -> u64 {
        self.max_drops
    }

    /// Number of registered subscribers (any state but closed).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Close and remove every subscriber.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.subscribers.lock().drain().collect();
        for (_, conn) in &drained {
            conn.close();
        }
        record_subscribers(0);
        if !drained.is_empty() {
            debug!(count = drained.len(), "closed all subscribers");
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn record_subscribers(count: usize) {
    ::metrics::gauge!(SSE_SUBSCRIBERS_ACTIVE).set(count as f64);
}

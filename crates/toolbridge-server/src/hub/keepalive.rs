//! Periodic SSE keep-alive pings.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::broadcast::BroadcastHub;
use super::connection::{Frame, SendOutcome, SubscriberConnection};

/// Outcome of the keep-alive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveResult {
    /// The queue closed or overflowed too often; the subscriber was removed.
    Failed,
    /// The loop was cancelled externally.
    Cancelled,
}

/// Send a `ping` frame every `interval` until the connection fails or
/// `cancel` fires.
///
/// The first ping goes out one full interval after start. A closed queue
/// unsubscribes the connection. A ping lost to a full queue counts toward the
/// hub's drop limit, same as a lost broadcast.
pub async fn run_keepalive(
    connection: Arc<SubscriberConnection>,
    hub: Arc<BroadcastHub>,
    interval: Duration,
    cancel: CancellationToken,
) -> KeepaliveResult {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    let ping = Arc::new(Frame::ping());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match connection.send(ping.clone()) {
                    SendOutcome::Delivered => {}
                    SendOutcome::Dropped if connection.drop_count() <= hub.max_drops() => {
                        debug!(conn_id = %connection.id, dropped = connection.drop_count(), "keep-alive ping dropped");
                    }
                    outcome @ (SendOutcome::Dropped | SendOutcome::Closed) => {
                        debug!(conn_id = %connection.id, ?outcome, "keep-alive failed");
                        hub.unsubscribe(&connection.id);
                        return KeepaliveResult::Failed;
                    }
                }
            }
            () = cancel.cancelled() => {
                return KeepaliveResult::Cancelled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::connection::ConnectionState;

    #[tokio::test(start_paused = true)]
    async fn pings_at_interval() {
        let hub = Arc::new(BroadcastHub::new(8, 10));
        let (conn, mut rx) = hub.subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_keepalive(
            conn,
            hub.clone(),
            Duration::from_secs(30),
            cancel.clone(),
        ));

        time::sleep(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv().unwrap().event, "ping");
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.try_recv().unwrap().event, "ping");

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), KeepaliveResult::Cancelled);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ping_unsubscribes() {
        let hub = Arc::new(BroadcastHub::new(8, 10));
        let (conn, rx) = hub.subscribe();
        drop(rx);

        let result = run_keepalive(
            conn.clone(),
            hub.clone(),
            Duration::from_millis(100),
            CancellationToken::new(),
        )
        .await;
        assert_eq!(result, KeepaliveResult::Failed);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_tolerated_up_to_drop_limit() {
        let hub = Arc::new(BroadcastHub::new(1, 2));
        let (conn, _rx) = hub.subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_keepalive(
            conn.clone(),
            hub.clone(),
            Duration::from_secs(1),
            cancel.clone(),
        ));

        // First ping fills the single slot, the next two are dropped.
        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(conn.drop_count(), 2);
        assert_eq!(hub.subscriber_count(), 1);
        assert!(!handle.is_finished());

        // A third drop exceeds the limit.
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.await.unwrap(), KeepaliveResult::Failed);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn cancel_before_first_tick() {
        let hub = Arc::new(BroadcastHub::new(8, 10));
        let (conn, _rx) = hub.subscribe();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = run_keepalive(conn, hub, Duration::from_secs(60), cancel).await;
        assert_eq!(result, KeepaliveResult::Cancelled);
    }
}

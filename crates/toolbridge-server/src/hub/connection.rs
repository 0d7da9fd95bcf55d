//! SSE subscriber connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::sync::mpsc;
use toolbridge_core::{BroadcastEvent, EventKind};
use tracing::warn;
use uuid::Uuid;

/// One SSE frame: an event name and its serialized data line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// SSE `event:` field.
    pub event: String,
    /// SSE `data:` field (single-line JSON).
    pub data: String,
}

impl Frame {
    /// Keep-alive frame.
    pub fn ping() -> Self {
        Self {
            event: "ping".into(),
            data: "{}".into(),
        }
    }

    /// Frame for a broadcast event.
    ///
    /// The manifest carries its payload as-is; tool events carry
    /// `{tool, correlation_id, payload}`.
    pub fn from_event(event: &BroadcastEvent) -> Self {
        let data: Value = match event.kind {
            EventKind::Manifest => event.payload.clone(),
            EventKind::ToolResult | EventKind::ToolError => json!({
                "tool": event.tool,
                "correlation_id": event.correlation_id,
                "payload": event.payload,
            }),
        };
        let data = serde_json::to_string(&data).unwrap_or_else(|e| {
            warn!(event = event.kind.as_str(), error = %e, "failed to serialize event");
            "{}".into()
        });
        Self {
            event: event.kind.as_str().into(),
            data,
        }
    }
}

/// Lifecycle of a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Registered, manifest not yet queued; receives no broadcasts.
    Connecting = 0,
    /// Receiving broadcasts.
    Active = 1,
    /// Removed from the hub; never reopens.
    Closed = 2,
}

impl ConnectionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Active,
            _ => Self::Closed,
        }
    }
}

/// Result of a non-blocking send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame queued.
    Delivered,
    /// Queue full; frame lost.
    Dropped,
    /// Receiver gone or connection closed.
    Closed,
}

/// A connected SSE client.
pub struct SubscriberConnection {
    /// Unique subscriber ID.
    pub id: String,
    tx: mpsc::Sender<Arc<Frame>>,
    state: AtomicU8,
    dropped: AtomicU64,
    /// When the subscriber connected.
    pub connected_at: Instant,
}

impl SubscriberConnection {
    /// Create a connection in the `Connecting` state.
    pub fn new(tx: mpsc::Sender<Arc<Frame>>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            tx,
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            dropped: AtomicU64::new(0),
            connected_at: Instant::now(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Connecting → Active`. Returns `false` if the connection was not
    /// `Connecting` (already active or closed).
    pub fn activate(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Connecting as u8,
                ConnectionState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Mark closed. Idempotent.
    pub fn close(&self) {
        self.state
            .store(ConnectionState::Closed as u8, Ordering::Release);
    }

    /// Queue a frame without waiting.
    pub fn send(&self, frame: Arc<Frame>) -> SendOutcome {
        if self.state() == ConnectionState::Closed {
            return SendOutcome::Closed;
        }
        match self.tx.try_send(frame) {
            Ok(()) => SendOutcome::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let _ = self.dropped.fetch_add(1, Ordering::Relaxed);
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                SendOutcome::Closed
            }
        }
    }

    /// Frames lost to a full queue.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbridge_core::{BridgeError, InvocationResult};

    fn make_connection(capacity: usize) -> (SubscriberConnection, mpsc::Receiver<Arc<Frame>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (SubscriberConnection::new(tx), rx)
    }

    #[test]
    fn starts_connecting() {
        let (conn, _rx) = make_connection(4);
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(!conn.id.is_empty());
    }

    #[test]
    fn activate_once() {
        let (conn, _rx) = make_connection(4);
        assert!(conn.activate());
        assert!(!conn.activate());
        assert_eq!(conn.state(), ConnectionState::Active);
    }

    #[test]
    fn closed_never_reopens() {
        let (conn, _rx) = make_connection(4);
        conn.close();
        assert!(!conn.activate());
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(conn.send(Arc::new(Frame::ping())), SendOutcome::Closed);
    }

    #[tokio::test]
    async fn send_delivers() {
        let (conn, mut rx) = make_connection(4);
        assert_eq!(conn.send(Arc::new(Frame::ping())), SendOutcome::Delivered);
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, "ping");
        assert_eq!(frame.data, "{}");
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let (conn, _rx) = make_connection(1);
        assert_eq!(conn.send(Arc::new(Frame::ping())), SendOutcome::Delivered);
        assert_eq!(conn.send(Arc::new(Frame::ping())), SendOutcome::Dropped);
        assert_eq!(conn.send(Arc::new(Frame::ping())), SendOutcome::Dropped);
        assert_eq!(conn.drop_count(), 2);
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }

    #[test]
    fn dropped_receiver_closes() {
        let (conn, rx) = make_connection(4);
        drop(rx);
        assert_eq!(conn.send(Arc::new(Frame::ping())), SendOutcome::Closed);
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn manifest_frame_is_payload() {
        let event = BroadcastEvent::manifest(json!({"tools": []}));
        let frame = Frame::from_event(&event);
        assert_eq!(frame.event, "manifest");
        assert_eq!(frame.data, r#"{"tools":[]}"#);
    }

    #[test]
    fn tool_error_frame_carries_correlation() {
        let result: InvocationResult = Err(BridgeError::UnknownTool {
            tool: "nope".into(),
        });
        let event = BroadcastEvent::from_result("nope", Some("c-1".into()), &result);
        let frame = Frame::from_event(&event);
        assert_eq!(frame.event, "tool_error");
        let data: Value = serde_json::from_str(&frame.data).unwrap();
        assert_eq!(data["correlation_id"], "c-1");
        assert_eq!(data["payload"]["error"], "Unknown tool");
        assert_eq!(data["payload"]["kind"], "unknown_tool");
    }
}

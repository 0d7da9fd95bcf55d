//! Broadcast hub: subscriber registry, fan-out, and keep-alive.

pub mod broadcast;
pub mod connection;
pub mod keepalive;

pub use broadcast::BroadcastHub;
pub use connection::{ConnectionState, Frame, SendOutcome, SubscriberConnection};
pub use keepalive::{KeepaliveResult, run_keepalive};

//! Realtime telemetry over STOMP/WebSocket
//!
//! The broker publishes the latest state of each scale as JSON MESSAGE
//! frames. This module owns the persistent connection ([`RealtimeClient`]),
//! the frame codec ([`stomp`]), the wire types ([`messages`]), the
//! last-write-wins snapshot map ([`SnapshotStore`]), and the topic
//! registry that makes resubscription after a reconnect automatic.

pub mod client;
pub mod messages;
pub mod snapshots;
pub mod stomp;
pub mod subscriptions;

pub use client::{RealtimeClient, RealtimeEvent};
pub use messages::{scale_topic, ScaleSnapshot, ScaleStatus, TOPIC_ALL_SCALES};
pub use snapshots::SnapshotStore;
pub use subscriptions::SubscriptionRegistry;

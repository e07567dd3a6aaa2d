//! Subscription Registry
//!
//! Tracks active topic subscriptions, keyed by topic. The invariant is
//! at most one subscription per topic: `add` is idempotent, and the
//! registry survives a connection drop so all topics can be reasserted
//! on reconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Registry of topic → STOMP subscription id
pub struct SubscriptionRegistry {
    inner: RwLock<HashMap<String, String>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a topic. Returns the new subscription id, or `None` if
    /// the topic is already subscribed.
    pub fn add(&self, topic: &str) -> Option<String> {
        let mut inner = self.inner.write().unwrap();
        if inner.contains_key(topic) {
            return None;
        }
        let id = format!("sub-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        inner.insert(topic.to_string(), id.clone());
        Some(id)
    }

    /// Remove a topic, yielding the subscription id to cancel
    pub fn remove(&self, topic: &str) -> Option<String> {
        self.inner.write().unwrap().remove(topic)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.inner.read().unwrap().contains_key(topic)
    }

    /// All active (topic, id) pairs, for resubscription after reconnect
    pub fn active(&self) -> Vec<(String, String)> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .map(|(topic, id)| (topic.clone(), id.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

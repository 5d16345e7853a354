//! Topic subscription index.
//!
//! Maps a topic name to the connections subscribed to it. Every operation
//! locks a single topic entry, so concurrent subscribe/unsubscribe on the
//! same topic serialize without losing updates. Topics are case-sensitive
//! and unvalidated.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::Connection;

#[derive(Default)]
pub struct TopicIndex {
    /// topic -> connection_id -> Connection
    topics: DashMap<String, HashMap<Uuid, Arc<Connection>>>,
}

impl TopicIndex {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Add `connection` to `topic`. Returns false if it was already a member.
    pub fn subscribe(&self, topic: &str, connection: Arc<Connection>) -> bool {
        let connection_id = connection.id;
        let added = self
            .topics
            .entry(topic.to_string())
            .or_default()
            .insert(connection_id, connection)
            .is_none();

        tracing::debug!(topic = %topic, connection_id = %connection_id, added, "Subscribed to topic");
        added
    }

    /// Remove `connection_id` from `topic`. Returns false if it was not a member.
    pub fn unsubscribe(&self, topic: &str, connection_id: Uuid) -> bool {
        let removed = match self.topics.get_mut(topic) {
            Some(mut members) => members.remove(&connection_id).is_some(),
            None => {
                tracing::info!(
                    topic = %topic,
                    connection_id = %connection_id,
                    "Topic has no subscribers, nothing to unsubscribe"
                );
                return false;
            }
        };

        // Re-checked under the entry lock so a racing subscribe is not dropped
        self.topics.remove_if(topic, |_, members| members.is_empty());

        tracing::debug!(topic = %topic, connection_id = %connection_id, removed, "Unsubscribed from topic");
        removed
    }

    /// Snapshot of the current subscribers, empty for unknown topics
    pub fn subscribers_of(&self, topic: &str) -> Vec<Arc<Connection>> {
        self.topics
            .get(topic)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, topic: &str, connection_id: Uuid) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|members| members.contains_key(&connection_id))
    }

    /// Drop `connection_id` from every topic. Returns how many topics it left.
    pub fn remove_connection(&self, connection_id: Uuid) -> usize {
        let mut left = 0;
        for mut entry in self.topics.iter_mut() {
            if entry.value_mut().remove(&connection_id).is_some() {
                left += 1;
            }
        }

        self.topics.retain(|_, members| !members.is_empty());
        left
    }

    /// Topics `connection_id` is currently subscribed to
    pub fn topics_of(&self, connection_id: Uuid) -> Vec<String> {
        self.topics
            .iter()
            .filter(|entry| entry.value().contains_key(&connection_id))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// topic -> subscriber count
    pub fn topic_counts(&self) -> HashMap<String, usize> {
        self.topics
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

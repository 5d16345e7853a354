use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::connection_manager::{Connection, ConnectionManager, LiveConnections, SessionRegistry, TopicIndex};
use crate::error::DispatchError;
use crate::metrics::MessageMetrics;
use crate::websocket::SocketMessage;

/// Outcome of one dispatch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    /// Connections the text was queued to
    pub delivered: usize,
    /// Connections whose send failed
    pub failed: usize,
    /// Targets already closed when the dispatcher reached them
    pub skipped: usize,
}

impl DeliveryResult {
    fn merge(&mut self, other: DeliveryResult) {
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    pub fn is_empty(&self) -> bool {
        self.delivered == 0 && self.failed == 0 && self.skipped == 0
    }
}

/// Statistics for the message dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub total_sent: AtomicU64,
    pub total_delivered: AtomicU64,
    pub total_failed: AtomicU64,
    pub broadcast_messages: AtomicU64,
    pub unicast_messages: AtomicU64,
    pub multicast_messages: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            broadcast_messages: self.broadcast_messages.load(Ordering::Relaxed),
            unicast_messages: self.unicast_messages.load(Ordering::Relaxed),
            multicast_messages: self.multicast_messages.load(Ordering::Relaxed),
        }
    }

    fn record(&self, mode: &AtomicU64, result: &DeliveryResult) {
        self.total_sent.fetch_add(1, Ordering::Relaxed);
        self.total_delivered.fetch_add(result.delivered as u64, Ordering::Relaxed);
        self.total_failed.fetch_add(result.failed as u64, Ordering::Relaxed);
        mode.fetch_add(1, Ordering::Relaxed);

        MessageMetrics::record_delivered(result.delivered as u64);
        MessageMetrics::record_failed(result.failed as u64);
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_sent: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub broadcast_messages: u64,
    pub unicast_messages: u64,
    pub multicast_messages: u64,
}

/// Best-effort delivery to connected clients.
///
/// Every send is attempted once. A failing recipient is logged and counted,
/// and the loop moves on; callers only ever see the aggregate result.
pub struct MessageDispatcher {
    live: Arc<LiveConnections>,
    sessions: Arc<SessionRegistry>,
    topics: Arc<TopicIndex>,
    stats: DispatcherStats,
}

impl MessageDispatcher {
    pub fn new(live: Arc<LiveConnections>, sessions: Arc<SessionRegistry>, topics: Arc<TopicIndex>) -> Self {
        Self {
            live,
            sessions,
            topics,
            stats: DispatcherStats::default(),
        }
    }

    pub fn from_manager(manager: &ConnectionManager) -> Self {
        Self::new(
            manager.live().clone(),
            manager.sessions().clone(),
            manager.topics().clone(),
        )
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Send `text` to every open connection
    #[tracing::instrument(name = "dispatcher.broadcast", skip(self, text), fields(len = text.len()))]
    pub fn broadcast(&self, text: &str) -> DeliveryResult {
        let connections = self.live.snapshot();
        let result = deliver(&connections, Arc::from(text));

        self.stats.record(&self.stats.broadcast_messages, &result);
        MessageMetrics::record_broadcast_sent();

        tracing::info!(
            delivered = result.delivered,
            failed = result.failed,
            skipped = result.skipped,
            "Broadcast message"
        );
        result
    }

    /// Send `text` to the connection registered under `user_id`, if any
    #[tracing::instrument(name = "dispatcher.unicast", skip(self, text), fields(len = text.len()))]
    pub fn unicast(&self, user_id: &str, text: &str) -> DeliveryResult {
        let result = self.unicast_one(user_id, Arc::from(text));

        self.stats.record(&self.stats.unicast_messages, &result);
        MessageMetrics::record_unicast_sent();
        result
    }

    /// Unicast the same text to several users
    #[tracing::instrument(
        name = "dispatcher.unicast_many",
        skip(self, user_ids, text),
        fields(user_count = user_ids.len())
    )]
    pub fn unicast_many(&self, user_ids: &[String], text: &str) -> DeliveryResult {
        let text: Arc<str> = Arc::from(text);
        let mut result = DeliveryResult::default();
        for user_id in user_ids {
            result.merge(self.unicast_one(user_id, text.clone()));
        }

        self.stats.record(&self.stats.unicast_messages, &result);
        MessageMetrics::record_unicast_sent();

        tracing::debug!(
            delivered = result.delivered,
            failed = result.failed,
            skipped = result.skipped,
            "Sent message to multiple users"
        );
        result
    }

    /// Serialize `message` once and send it to every subscriber of `topic`
    #[tracing::instrument(name = "dispatcher.multicast", skip(self, message))]
    pub fn multicast(&self, topic: &str, message: &SocketMessage) -> Result<DeliveryResult, DispatchError> {
        let subscribers = self.topics.subscribers_of(topic);
        if subscribers.is_empty() {
            tracing::info!(topic = %topic, "Topic has no subscribers, nothing sent");
            self.stats.record(&self.stats.multicast_messages, &DeliveryResult::default());
            MessageMetrics::record_multicast_sent();
            return Ok(DeliveryResult::default());
        }

        let text: Arc<str> = Arc::from(message.to_json()?);
        let result = deliver(&subscribers, text);

        self.stats.record(&self.stats.multicast_messages, &result);
        MessageMetrics::record_multicast_sent();

        tracing::info!(
            topic = %topic,
            subscribers = subscribers.len(),
            delivered = result.delivered,
            failed = result.failed,
            "Multicast message to topic"
        );
        Ok(result)
    }

    fn unicast_one(&self, user_id: &str, text: Arc<str>) -> DeliveryResult {
        match self.sessions.get(user_id) {
            Some(connection) => deliver(std::slice::from_ref(&connection), text),
            None => {
                tracing::debug!(user_id = %user_id, "No session for user, nothing sent");
                DeliveryResult::default()
            }
        }
    }
}

/// Queue `text` on each open connection, logging failures individually
fn deliver(connections: &[Arc<Connection>], text: Arc<str>) -> DeliveryResult {
    let mut result = DeliveryResult::default();

    for connection in connections {
        if !connection.is_open() {
            result.skipped += 1;
            continue;
        }

        match connection.send(text.clone()) {
            Ok(()) => result.delivered += 1,
            Err(e) => {
                result.failed += 1;
                tracing::warn!(
                    connection_id = %connection.id,
                    user_id = %connection.user_id,
                    error = %e,
                    "Failed to send to connection"
                );
            }
        }
    }

    result
}

//! Connection bookkeeping: the live set, the user session registry and the
//! topic subscription index.
//!
//! The three containers are independent. Each operation on one of them is
//! atomic, but nothing spans containers: a connection can briefly be present
//! in one and absent from another while it opens or closes.

mod live;
mod registry;
mod stats;
mod topics;
mod types;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use live::LiveConnections;
pub use registry::SessionRegistry;
pub use stats::{ConnectionStats, TopicInfo};
pub use topics::TopicIndex;
pub use types::{Connection, OutboundFrame};

/// Owns the shared containers and runs the open/close lifecycle
pub struct ConnectionManager {
    live: Arc<LiveConnections>,
    sessions: Arc<SessionRegistry>,
    topics: Arc<TopicIndex>,
    cleanup_subscriptions_on_close: bool,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::with_cleanup(true)
    }

    /// `cleanup_subscriptions_on_close = false` keeps closed connections in
    /// topic sets, where later multicasts count them as skipped
    pub fn with_cleanup(cleanup_subscriptions_on_close: bool) -> Self {
        Self {
            live: Arc::new(LiveConnections::new()),
            sessions: Arc::new(SessionRegistry::new()),
            topics: Arc::new(TopicIndex::new()),
            cleanup_subscriptions_on_close,
        }
    }

    pub fn live(&self) -> &Arc<LiveConnections> {
        &self.live
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn topics(&self) -> &Arc<TopicIndex> {
        &self.topics
    }

    /// Create a connection for `user_id` and make it reachable
    pub fn open(&self, user_id: impl Into<String>, sender: mpsc::Sender<OutboundFrame>) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(user_id, sender));

        self.live.insert(connection.clone());
        self.sessions.put(connection.user_id.clone(), connection.clone());

        tracing::info!(
            connection_id = %connection.id,
            user_id = %connection.user_id,
            total = self.live.len(),
            "Connection opened"
        );

        connection
    }

    /// Make a connection unreachable and close its transport
    pub fn close(&self, connection: &Connection) {
        connection.close();

        self.live.remove(connection.id);

        // A newer connection for the same user keeps its registry entry
        let unregistered = self.sessions.remove_if(&connection.user_id, connection.id);

        let topics_left = if self.cleanup_subscriptions_on_close {
            self.topics.remove_connection(connection.id)
        } else {
            0
        };

        tracing::info!(
            connection_id = %connection.id,
            user_id = %connection.user_id,
            unregistered,
            topics_left,
            total = self.live.len(),
            "Connection closed"
        );
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            total_connections: self.live.len(),
            unique_users: self.sessions.len(),
            topics: self.topics.topic_counts(),
        }
    }

    pub fn topic_info(&self) -> Vec<TopicInfo> {
        let mut topics: Vec<TopicInfo> = self
            .topics
            .topic_counts()
            .into_iter()
            .map(|(name, subscriber_count)| TopicInfo {
                name,
                subscriber_count,
            })
            .collect();
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        topics
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_registers_everywhere_but_topics() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::channel(4);

        let conn = manager.open("u1", tx);

        assert!(manager.live().get(conn.id).is_some());
        assert_eq!(manager.sessions().get("u1").unwrap().id, conn.id);
        assert!(manager.topics().topics_of(conn.id).is_empty());
    }

    #[test]
    fn test_close_cleans_topics_when_enabled() {
        let manager = ConnectionManager::with_cleanup(true);
        let (tx, _rx) = mpsc::channel(4);
        let conn = manager.open("u1", tx);
        manager.topics().subscribe("t1", conn.clone());

        manager.close(&conn);

        assert!(!conn.is_open());
        assert!(manager.live().is_empty());
        assert!(manager.sessions().get("u1").is_none());
        assert!(manager.topics().subscribers_of("t1").is_empty());
    }

    #[test]
    fn test_close_keeps_topics_when_disabled() {
        let manager = ConnectionManager::with_cleanup(false);
        let (tx, _rx) = mpsc::channel(4);
        let conn = manager.open("u1", tx);
        manager.topics().subscribe("t1", conn.clone());

        manager.close(&conn);

        assert_eq!(manager.topics().subscribers_of("t1").len(), 1);
    }

    #[test]
    fn test_stale_close_keeps_newer_session() {
        let manager = ConnectionManager::new();
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);
        let first = manager.open("u1", tx1);
        let second = manager.open("u1", tx2);

        manager.close(&first);

        assert_eq!(manager.sessions().get("u1").unwrap().id, second.id);
        assert_eq!(manager.stats().total_connections, 1);
    }

    #[test]
    fn test_topic_info_sorted() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::channel(4);
        let conn = manager.open("u1", tx);
        manager.topics().subscribe("zeta", conn.clone());
        manager.topics().subscribe("alpha", conn.clone());

        let names: Vec<_> = manager.topic_info().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}

//! Hub integration tests
//!
//! These drive the connection manager, the inbound protocol handler and the
//! dispatcher together over in-memory transports, without a running server.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

use topic_hub::connection_manager::{Connection, ConnectionManager, OutboundFrame};
use topic_hub::dispatch::MessageDispatcher;
use topic_hub::websocket::{FrameOutcome, InboundHandler, SocketMessage};

struct TestHub {
    manager: Arc<ConnectionManager>,
    dispatcher: MessageDispatcher,
}

impl TestHub {
    fn new() -> Self {
        Self::with_cleanup(true)
    }

    fn with_cleanup(cleanup: bool) -> Self {
        let manager = Arc::new(ConnectionManager::with_cleanup(cleanup));
        let dispatcher = MessageDispatcher::from_manager(&manager);
        Self { manager, dispatcher }
    }

    /// Open a connection and return its protocol handler plus the peer's inbox
    fn connect(&self, user_id: &str) -> (InboundHandler, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(16);
        let connection = self.manager.open(user_id, tx);
        let handler = InboundHandler::new(connection, self.manager.topics().clone(), "empty message");
        (handler, rx)
    }

    fn disconnect(&self, handler: &mut InboundHandler) {
        handler.close();
        self.manager.close(handler.connection());
    }
}

fn subscribe_frame(topic: &str) -> String {
    json!({"header": {"messageType": "subscribe", "topic": topic}}).to_string()
}

fn unsubscribe_frame(topic: &str) -> String {
    json!({"header": {"messageType": "unsubscribe", "topic": topic}}).to_string()
}

fn drain_texts(rx: &mut mpsc::Receiver<OutboundFrame>) -> Vec<String> {
    let mut texts = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Some(text) = frame.as_text() {
            texts.push(text.to_string());
        }
    }
    texts
}

// =============================================================================
// Topic scenarios
// =============================================================================

mod topic_tests {
    use super::*;

    #[test]
    fn test_subscribe_multicast_unsubscribe() {
        let hub = TestHub::new();
        let (mut a, mut rx) = hub.connect("u1");

        a.on_text(&subscribe_frame("t1"));
        let env = SocketMessage::new("type1", "t1", json!("business data"));
        let result = assert_ok!(hub.dispatcher.multicast("t1", &env));

        assert_eq!(result.delivered, 1);
        let received = drain_texts(&mut rx);
        assert_eq!(received.len(), 1);
        assert_eq!(SocketMessage::parse(&received[0]).unwrap(), env);

        a.on_text(&unsubscribe_frame("t1"));
        let env2 = SocketMessage::new("type1", "t1", json!("second"));
        let result = hub.dispatcher.multicast("t1", &env2).unwrap();

        assert!(result.is_empty());
        assert!(drain_texts(&mut rx).is_empty());
    }

    #[test]
    fn test_multicast_reaches_only_subscribers() {
        let hub = TestHub::new();
        let (mut a, mut rx_a) = hub.connect("a");
        let (mut b, mut rx_b) = hub.connect("b");
        let (_c, mut rx_c) = hub.connect("c");

        a.on_text(&subscribe_frame("orders"));
        b.on_text(&subscribe_frame("orders"));
        b.on_text(&subscribe_frame("alerts"));

        let env = SocketMessage::new("type1", "alerts", json!({"level": "high"}));
        hub.dispatcher.multicast("alerts", &env).unwrap();

        assert!(drain_texts(&mut rx_a).is_empty());
        assert_eq!(drain_texts(&mut rx_b).len(), 1);
        assert!(drain_texts(&mut rx_c).is_empty());
    }

    #[test]
    fn test_subscription_without_registry_entry() {
        let hub = TestHub::new();
        let (mut first, mut rx_first) = hub.connect("shared");
        let (_second, _rx_second) = hub.connect("shared");

        // `first` lost its registry entry but is still a topic subscriber
        first.on_text(&subscribe_frame("t1"));
        assert_ne!(hub.manager.sessions().get("shared").unwrap().id, first.connection().id);

        let env = SocketMessage::new("type1", "t1", json!(1));
        assert_eq!(hub.dispatcher.multicast("t1", &env).unwrap().delivered, 1);
        assert_eq!(drain_texts(&mut rx_first).len(), 1);
    }

    #[test]
    fn test_malformed_frames_do_not_disturb_subscriptions() {
        let hub = TestHub::new();
        let (mut a, mut rx) = hub.connect("u1");

        a.on_text(&subscribe_frame("t1"));
        assert_eq!(a.on_text("definitely not json"), FrameOutcome::Malformed);
        assert_eq!(a.on_text(r#"{"header":{}}"#), FrameOutcome::Ignored);

        let env = SocketMessage::new("type1", "t1", json!(null));
        assert_eq!(hub.dispatcher.multicast("t1", &env).unwrap().delivered, 1);
        assert_eq!(drain_texts(&mut rx).len(), 1);
    }
}

// =============================================================================
// Unicast and broadcast scenarios
// =============================================================================

mod delivery_tests {
    use super::*;

    #[test]
    fn test_unicast_before_connect_is_silent() {
        let hub = TestHub::new();

        let result = hub.dispatcher.unicast("u1", "hello");

        assert!(result.is_empty());
    }

    #[test]
    fn test_unicast_last_writer_wins() {
        let hub = TestHub::new();
        let (_first, mut rx_first) = hub.connect("u1");
        let (_second, mut rx_second) = hub.connect("u1");

        let result = hub.dispatcher.unicast("u1", "x");

        assert_eq!(result.delivered, 1);
        assert!(drain_texts(&mut rx_first).is_empty());
        assert_eq!(drain_texts(&mut rx_second), vec!["x".to_string()]);
    }

    #[test]
    fn test_unicast_after_disconnect_is_silent() {
        let hub = TestHub::new();
        let (mut a, _rx) = hub.connect("u1");

        hub.disconnect(&mut a);

        assert!(hub.dispatcher.unicast("u1", "hello").is_empty());
    }

    #[test]
    fn test_broadcast_reaches_unregistered_connections() {
        let hub = TestHub::new();
        let (_first, mut rx_first) = hub.connect("u1");
        let (_second, mut rx_second) = hub.connect("u1");

        let result = hub.dispatcher.broadcast("everyone");

        assert_eq!(result.delivered, 2);
        assert_eq!(drain_texts(&mut rx_first), vec!["everyone".to_string()]);
        assert_eq!(drain_texts(&mut rx_second), vec!["everyone".to_string()]);
    }

    #[test]
    fn test_broadcast_survives_closed_peers() {
        let hub = TestHub::new();
        let mut receivers = Vec::new();
        for i in 0..10 {
            let (_handler, rx) = hub.connect(&format!("user-{}", i));
            receivers.push(rx);
        }
        // Peers 0, 3, 6, 9 vanish without the hub noticing
        let mut open = Vec::new();
        for (i, rx) in receivers.into_iter().enumerate() {
            if i % 3 != 0 {
                open.push(rx);
            }
        }

        let result = hub.dispatcher.broadcast("still here");

        assert_eq!(result.delivered, 6);
        assert_eq!(result.skipped, 4);
        for mut rx in open {
            assert_eq!(drain_texts(&mut rx), vec!["still here".to_string()]);
        }
    }

    #[test]
    fn test_dispatcher_stats_accumulate() {
        let hub = TestHub::new();
        let (_a, _rx) = hub.connect("u1");

        hub.dispatcher.broadcast("one");
        hub.dispatcher.unicast("u1", "two");
        hub.dispatcher.unicast("ghost", "three");

        let stats = hub.dispatcher.stats();
        assert_eq!(stats.total_sent, 3);
        assert_eq!(stats.total_delivered, 2);
        assert_eq!(stats.broadcast_messages, 1);
        assert_eq!(stats.unicast_messages, 2);
    }
}

// =============================================================================
// Lifecycle scenarios
// =============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_close_removes_topic_memberships() {
        let hub = TestHub::with_cleanup(true);
        let (mut a, _rx) = hub.connect("u1");
        a.on_text(&subscribe_frame("t1"));

        hub.disconnect(&mut a);

        assert!(hub.manager.topics().subscribers_of("t1").is_empty());
        let env = SocketMessage::new("type1", "t1", json!(null));
        assert!(hub.dispatcher.multicast("t1", &env).unwrap().is_empty());
    }

    #[test]
    fn test_close_without_cleanup_leaves_dead_subscriber() {
        let hub = TestHub::with_cleanup(false);
        let (mut a, _rx) = hub.connect("u1");
        a.on_text(&subscribe_frame("t1"));

        hub.disconnect(&mut a);

        let env = SocketMessage::new("type1", "t1", json!(null));
        let result = hub.dispatcher.multicast("t1", &env).unwrap();
        assert_eq!(result.delivered, 0);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_frames_after_close_are_rejected() {
        let hub = TestHub::new();
        let (mut a, _rx) = hub.connect("u1");

        hub.disconnect(&mut a);

        assert_eq!(a.on_text(&subscribe_frame("t1")), FrameOutcome::Rejected);
        assert_eq!(hub.manager.topics().topic_count(), 0);
    }

    #[test]
    fn test_stale_disconnect_keeps_newer_session() {
        let hub = TestHub::new();
        let (mut first, _rx_first) = hub.connect("u1");
        let (_second, mut rx_second) = hub.connect("u1");

        hub.disconnect(&mut first);

        assert_eq!(hub.dispatcher.unicast("u1", "x").delivered, 1);
        assert_eq!(drain_texts(&mut rx_second), vec!["x".to_string()]);
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_connect_disconnect_storm() {
        let hub = Arc::new(TestHub::new());

        let mut tasks = Vec::new();
        for i in 0..32 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                for j in 0..50 {
                    let (mut handler, _rx) = hub.connect(&format!("user-{}", (i + j) % 8));
                    handler.on_text(&subscribe_frame("storm"));
                    hub.dispatcher.broadcast("tick");
                    hub.disconnect(&mut handler);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stats = hub.manager.stats();
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.unique_users, 0);
        assert!(hub.manager.topics().subscribers_of("storm").is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribes_during_multicast() {
        let hub = Arc::new(TestHub::new());
        let mut connections: Vec<Arc<Connection>> = Vec::new();
        let mut _receivers = Vec::new();
        for i in 0..50 {
            let (tx, rx) = mpsc::channel(64);
            connections.push(hub.manager.open(format!("user-{}", i), tx));
            _receivers.push(rx);
        }

        let subscriber_hub = hub.clone();
        let to_subscribe = connections.clone();
        let subscriber = tokio::spawn(async move {
            for conn in to_subscribe {
                subscriber_hub.manager.topics().subscribe("live", conn);
                tokio::task::yield_now().await;
            }
        });

        let env = SocketMessage::new("type1", "live", json!(null));
        for _ in 0..20 {
            let result = hub.dispatcher.multicast("live", &env).unwrap();
            assert!(result.delivered <= 50);
            tokio::task::yield_now().await;
        }
        subscriber.await.unwrap();

        let final_result = hub.dispatcher.multicast("live", &env).unwrap();
        assert_eq!(final_result.delivered, 50);
    }
}

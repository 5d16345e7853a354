//! Prometheus metrics for the hub.
//!
//! - Connection metrics (live connections, registered users, active topics)
//! - Inbound frame metrics by kind
//! - Outbound message metrics by delivery mode

mod helpers;

pub use helpers::{encode_metrics, MessageMetrics, WsMessageMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "topic_hub";

lazy_static! {
    // ============================================================================
    // Connection Metrics
    // ============================================================================

    /// Number of open WebSocket connections
    pub static ref CONNECTIONS_TOTAL: IntGauge = register_int_gauge!(
        format!("{}_connections_total", METRIC_PREFIX),
        "Number of open WebSocket connections"
    ).unwrap();

    /// Number of user ids in the session registry
    pub static ref USERS_CONNECTED: IntGauge = register_int_gauge!(
        format!("{}_users_connected", METRIC_PREFIX),
        "Number of user ids with a registered session"
    ).unwrap();

    /// Topics with at least one subscriber
    pub static ref TOPICS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_topics_active", METRIC_PREFIX),
        "Number of topics with at least one subscriber"
    ).unwrap();

    pub static ref WS_CONNECTIONS_OPENED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_opened_total", METRIC_PREFIX),
        "Total WebSocket connections opened"
    ).unwrap();

    pub static ref WS_CONNECTIONS_CLOSED: IntCounter = register_int_counter!(
        format!("{}_ws_connections_closed_total", METRIC_PREFIX),
        "Total WebSocket connections closed"
    ).unwrap();

    pub static ref WS_CONNECTION_DURATION: Histogram = register_histogram!(
        format!("{}_ws_connection_duration_seconds", METRIC_PREFIX),
        "WebSocket connection lifetime in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 1800.0, 3600.0, 86400.0]
    ).unwrap();

    /// Inbound frames by kind (subscribe, unsubscribe, other, malformed, empty)
    pub static ref WS_FRAMES_RECEIVED: IntCounterVec = register_int_counter_vec!(
        format!("{}_ws_frames_received_total", METRIC_PREFIX),
        "Total inbound WebSocket frames by kind",
        &["kind"]
    ).unwrap();

    // ============================================================================
    // Message Metrics
    // ============================================================================

    /// Dispatch calls by mode
    pub static ref MESSAGES_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_sent_total", METRIC_PREFIX),
        "Total dispatch calls by delivery mode",
        &["mode"]
    ).unwrap();

    pub static ref MESSAGES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_delivered_total", METRIC_PREFIX),
        "Total frames queued to connections"
    ).unwrap();

    pub static ref MESSAGES_FAILED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Total per-connection send failures"
    ).unwrap();
}

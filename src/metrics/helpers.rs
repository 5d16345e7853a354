//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    MESSAGES_DELIVERED_TOTAL, MESSAGES_FAILED_TOTAL, MESSAGES_SENT_TOTAL, WS_FRAMES_RECEIVED,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording outbound message metrics
pub struct MessageMetrics;

impl MessageMetrics {
    pub fn record_broadcast_sent() {
        MESSAGES_SENT_TOTAL.with_label_values(&["broadcast"]).inc();
    }

    pub fn record_unicast_sent() {
        MESSAGES_SENT_TOTAL.with_label_values(&["unicast"]).inc();
    }

    pub fn record_multicast_sent() {
        MESSAGES_SENT_TOTAL.with_label_values(&["multicast"]).inc();
    }

    pub fn record_delivered(count: u64) {
        MESSAGES_DELIVERED_TOTAL.inc_by(count);
    }

    pub fn record_failed(count: u64) {
        MESSAGES_FAILED_TOTAL.inc_by(count);
    }
}

/// Helper struct for recording inbound frame metrics
pub struct WsMessageMetrics;

impl WsMessageMetrics {
    pub fn record_subscribe() {
        WS_FRAMES_RECEIVED.with_label_values(&["subscribe"]).inc();
    }

    pub fn record_unsubscribe() {
        WS_FRAMES_RECEIVED.with_label_values(&["unsubscribe"]).inc();
    }

    pub fn record_other() {
        WS_FRAMES_RECEIVED.with_label_values(&["other"]).inc();
    }

    pub fn record_malformed() {
        WS_FRAMES_RECEIVED.with_label_values(&["malformed"]).inc();
    }

    pub fn record_empty() {
        WS_FRAMES_RECEIVED.with_label_values(&["empty"]).inc();
    }
}

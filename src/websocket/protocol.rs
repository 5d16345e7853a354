//! Per-connection inbound frame handling.
//!
//! The handler owns nothing but its own state: it borrows the topic index
//! and the connection it reads for. Every frame produces a [`FrameOutcome`];
//! malformed or unrecognized input is logged here and never escalates.

use std::sync::Arc;

use crate::connection_manager::{Connection, TopicIndex};
use crate::metrics::WsMessageMetrics;

use super::message::{Control, SocketMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    Open,
    Reading,
    Closed,
}

/// Result of handling one inbound text frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Subscribed { topic: String, added: bool },
    Unsubscribed { topic: String, removed: bool },
    /// Valid envelope the hub does not act on
    Ignored,
    /// Empty frame; the peer was sent a notice
    Empty,
    Malformed,
    /// Frame arrived after the handler closed
    Rejected,
}

pub struct InboundHandler {
    connection: Arc<Connection>,
    topics: Arc<TopicIndex>,
    empty_message_notice: String,
    state: HandlerState,
}

impl InboundHandler {
    pub fn new(connection: Arc<Connection>, topics: Arc<TopicIndex>, empty_message_notice: impl Into<String>) -> Self {
        Self {
            connection,
            topics,
            empty_message_notice: empty_message_notice.into(),
            state: HandlerState::Open,
        }
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn on_text(&mut self, text: &str) -> FrameOutcome {
        if self.state == HandlerState::Closed {
            return FrameOutcome::Rejected;
        }

        self.state = HandlerState::Reading;
        let outcome = self.handle_text(text);
        if self.state == HandlerState::Reading {
            self.state = HandlerState::Open;
        }

        tracing::debug!(
            connection_id = %self.connection.id,
            user_id = %self.connection.user_id,
            frame = %text,
            outcome = ?outcome,
            "Received client frame"
        );

        outcome
    }

    pub fn close(&mut self) {
        self.state = HandlerState::Closed;
    }

    fn handle_text(&self, text: &str) -> FrameOutcome {
        if text.is_empty() {
            WsMessageMetrics::record_empty();
            if let Err(e) = self.connection.send(self.empty_message_notice.as_str()) {
                tracing::warn!(connection_id = %self.connection.id, error = %e, "Failed to send empty message notice");
            }
            return FrameOutcome::Empty;
        }

        let message = match SocketMessage::parse(text) {
            Ok(m) => m,
            Err(e) => {
                WsMessageMetrics::record_malformed();
                tracing::warn!(
                    connection_id = %self.connection.id,
                    error = %e,
                    "Frame is not a subscription envelope"
                );
                return FrameOutcome::Malformed;
            }
        };

        let Some(header) = message.header else {
            WsMessageMetrics::record_other();
            return FrameOutcome::Ignored;
        };
        let Some(control) = header.control() else {
            WsMessageMetrics::record_other();
            return FrameOutcome::Ignored;
        };

        match control {
            Control::Subscribe => {
                WsMessageMetrics::record_subscribe();
                let Some(topic) = header.topic.clone() else {
                    self.log_missing_topic("subscribe");
                    return FrameOutcome::Ignored;
                };
                let added = self.topics.subscribe(&topic, self.connection.clone());
                tracing::info!(connection_id = %self.connection.id, topic = %topic, "Subscribed to topic");
                FrameOutcome::Subscribed { topic, added }
            }
            Control::Unsubscribe => {
                WsMessageMetrics::record_unsubscribe();
                let Some(topic) = header.topic.clone() else {
                    self.log_missing_topic("unsubscribe");
                    return FrameOutcome::Ignored;
                };
                let removed = self.topics.unsubscribe(&topic, self.connection.id);
                tracing::info!(connection_id = %self.connection.id, topic = %topic, removed, "Unsubscribed from topic");
                FrameOutcome::Unsubscribed { topic, removed }
            }
            Control::Other(_) => {
                WsMessageMetrics::record_other();
                FrameOutcome::Ignored
            }
        }
    }

    fn log_missing_topic(&self, action: &str) {
        tracing::debug!(connection_id = %self.connection.id, action, "Control frame without topic");
    }
}

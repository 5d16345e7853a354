use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// Protocol version stamped on every envelope the server builds
pub const PROTOCOL_VERSION: &str = "V1.0";

pub const SUBSCRIBE: &str = "subscribe";
pub const UNSUBSCRIBE: &str = "unsubscribe";

/// Envelope exchanged in both directions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    /// `null` when absent
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub body: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub call_id: Option<String>,
}

// Clients are loose about the scalar types of informational header fields.
// Only `messageType` and `topic` drive the hub, so these never reject a frame.

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// What an inbound `messageType` asks the hub to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control<'a> {
    Subscribe,
    Unsubscribe,
    /// Application payload, not acted on by the hub
    Other(&'a str),
}

impl<'a> Control<'a> {
    pub fn from_message_type(message_type: &'a str) -> Self {
        match message_type {
            SUBSCRIBE => Self::Subscribe,
            UNSUBSCRIBE => Self::Unsubscribe,
            other => Self::Other(other),
        }
    }
}

impl Header {
    /// Server-built header: fixed version, current time, callId = timestamp
    pub fn new(message_type: impl Into<String>, topic: impl Into<String>) -> Self {
        let timestamp = Utc::now().timestamp_millis();
        Self {
            version: Some(PROTOCOL_VERSION.to_string()),
            timestamp: Some(timestamp),
            message_type: Some(message_type.into()),
            topic: Some(topic.into()),
            call_id: Some(timestamp.to_string()),
        }
    }

    pub fn control(&self) -> Option<Control<'_>> {
        self.message_type.as_deref().map(Control::from_message_type)
    }
}

impl SocketMessage {
    pub fn new(message_type: impl Into<String>, topic: impl Into<String>, body: Value) -> Self {
        Self {
            header: Some(Header::new(message_type, topic)),
            body,
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn topic(&self) -> Option<&str> {
        self.header.as_ref().and_then(|h| h.topic.as_deref())
    }
}

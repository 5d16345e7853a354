//! Connection handle and outbound frame types

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::error::TransportError;

/// Frames queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Text payload, shared so one serialization can fan out to many connections
    Text(Arc<str>),
    /// Ask the writer to send a close frame and stop
    Close,
}

impl OutboundFrame {
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_ref()),
            Self::Close => None,
        }
    }
}

/// Handle for a single WebSocket connection.
///
/// Sends never wait on socket I/O: frames go into a bounded queue drained by
/// the connection's writer task, and a full queue is reported as a failure.
#[derive(Debug)]
pub struct Connection {
    pub id: Uuid,
    pub user_id: String,
    pub opened_at: DateTime<Utc>,
    sender: mpsc::Sender<OutboundFrame>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(user_id: impl Into<String>, sender: mpsc::Sender<OutboundFrame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            opened_at: Utc::now(),
            sender,
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the transport can still take frames
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && !self.sender.is_closed()
    }

    /// Queue a text frame for the peer
    pub fn send(&self, text: impl Into<Arc<str>>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.sender
            .try_send(OutboundFrame::text(text))
            .map_err(|e| match e {
                TrySendError::Full(_) => TransportError::BufferFull,
                TrySendError::Closed(_) => TransportError::Closed,
            })
    }

    /// Mark closed and ask the writer to close the socket. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Writer may already be gone; nothing to close then.
        let _ = self.sender.try_send(OutboundFrame::Close);
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

//! API layer - HTTP endpoint handlers organized by concern.

mod health;
mod messages;
mod metrics;
mod routes;
mod topics;

pub use health::{health, stats};
pub use messages::{
    broadcast_message, multicast_message, send_topic_message, unicast_many_message,
    unicast_message, SendMessageResponse,
};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use topics::{get_session, get_topic, list_topics};

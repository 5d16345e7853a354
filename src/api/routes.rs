use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::{health, stats};
use super::messages::{
    broadcast_message, multicast_message, send_topic_message, unicast_many_message,
    unicast_message,
};
use super::metrics::prometheus_metrics;
use super::topics::{get_session, get_topic, list_topics};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Legacy topic trigger, shares the prefix with the WebSocket endpoint
        .route("/websocket/sendMessage", get(send_topic_message))
        .nest(
            "/api/v1",
            Router::new()
                .route("/messages/broadcast", post(broadcast_message))
                .route("/messages/unicast", post(unicast_message))
                .route("/messages/unicast-many", post(unicast_many_message))
                .route("/messages/multicast", post(multicast_message))
                .route("/topics", get(list_topics))
                .route("/topics/{topic}", get(get_topic))
                .route("/sessions/{user_id}", get(get_session))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}

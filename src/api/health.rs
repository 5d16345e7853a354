use axum::{extract::State, Json};
use serde::Serialize;

use crate::connection_manager::TopicInfo;
use crate::dispatch::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: ConnectionSummary,
    pub messages: DispatcherStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ConnectionSummary {
    pub total_connections: usize,
    pub unique_users: usize,
    pub topics: Vec<TopicInfo>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let conn_stats = state.connections.stats();

    Json(StatsResponse {
        connections: ConnectionSummary {
            total_connections: conn_stats.total_connections,
            unique_users: conn_stats.unique_users,
            topics: state.connections.topic_info(),
        },
        messages: state.dispatcher.stats(),
    })
}

//! Topic and session inspection endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::connection_manager::TopicInfo;
use crate::error::{AppError, Result};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct TopicListResponse {
    pub topics: Vec<TopicInfo>,
    pub total_topics: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub connection_id: String,
    pub connected_at: DateTime<Utc>,
    pub is_open: bool,
    pub topics: Vec<String>,
}

/// GET /api/v1/topics - List topics with subscriber counts
pub async fn list_topics(State(state): State<AppState>) -> Json<TopicListResponse> {
    let topics = state.connections.topic_info();
    let total = topics.len();

    Json(TopicListResponse {
        topics,
        total_topics: total,
    })
}

/// GET /api/v1/topics/{topic} - Subscriber count for one topic
pub async fn get_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<TopicInfo>> {
    let subscriber_count = state.connections.topics().subscribers_of(&topic).len();
    if subscriber_count == 0 {
        return Err(AppError::NotFound(format!(
            "Topic '{}' not found or has no subscribers",
            topic
        )));
    }

    Ok(Json(TopicInfo {
        name: topic,
        subscriber_count,
    }))
}

/// GET /api/v1/sessions/{user_id} - The connection registered for a user
pub async fn get_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let connection = state
        .connections
        .sessions()
        .get(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("User '{}' has no session", user_id)))?;

    let mut topics = state.connections.topics().topics_of(connection.id);
    topics.sort();

    Ok(Json(SessionResponse {
        user_id,
        connection_id: connection.id.to_string(),
        connected_at: connection.opened_at,
        is_open: connection.is_open(),
        topics,
    }))
}

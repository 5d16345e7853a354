//! HTTP triggers for the dispatcher.
//!
//! These only translate requests into dispatcher calls. Delivery is best
//! effort, so a request succeeds even when nobody received the message.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::DeliveryResult;
use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::websocket::SocketMessage;

/// messageType used when a trigger does not name one
const DEFAULT_MESSAGE_TYPE: &str = "message";

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UnicastRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UnicastManyRequest {
    pub user_ids: Vec<String>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct MulticastRequest {
    pub topic: String,
    pub message_type: Option<String>,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Query for the legacy `GET /websocket/sendMessage` trigger
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageQuery {
    pub topic: String,
    pub message_type: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    #[serde(flatten)]
    pub delivery: DeliveryResult,
    pub timestamp: DateTime<Utc>,
}

impl From<DeliveryResult> for SendMessageResponse {
    fn from(delivery: DeliveryResult) -> Self {
        Self {
            success: true,
            delivery,
            timestamp: Utc::now(),
        }
    }
}

pub async fn broadcast_message(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Json<SendMessageResponse> {
    Json(state.dispatcher.broadcast(&request.text).into())
}

pub async fn unicast_message(
    State(state): State<AppState>,
    Json(request): Json<UnicastRequest>,
) -> Json<SendMessageResponse> {
    Json(state.dispatcher.unicast(&request.user_id, &request.text).into())
}

pub async fn unicast_many_message(
    State(state): State<AppState>,
    Json(request): Json<UnicastManyRequest>,
) -> Json<SendMessageResponse> {
    Json(state.dispatcher.unicast_many(&request.user_ids, &request.text).into())
}

pub async fn multicast_message(
    State(state): State<AppState>,
    Json(request): Json<MulticastRequest>,
) -> Result<Json<SendMessageResponse>> {
    if request.topic.is_empty() {
        return Err(AppError::Validation("topic must not be empty".to_string()));
    }

    let message_type = request.message_type.as_deref().unwrap_or(DEFAULT_MESSAGE_TYPE);
    let message = SocketMessage::new(message_type, request.topic.as_str(), request.body);
    let delivery = state.dispatcher.multicast(&request.topic, &message)?;

    Ok(Json(delivery.into()))
}

/// GET /websocket/sendMessage?topic=..: multicast and answer `true`
pub async fn send_topic_message(
    State(state): State<AppState>,
    Query(query): Query<SendMessageQuery>,
) -> Result<Json<bool>> {
    let message_type = query.message_type.as_deref().unwrap_or(DEFAULT_MESSAGE_TYPE);
    let body = query.body.map(serde_json::Value::String).unwrap_or_default();
    let message = SocketMessage::new(message_type, query.topic.as_str(), body);

    state.dispatcher.multicast(&query.topic, &message)?;

    Ok(Json(true))
}

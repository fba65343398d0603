use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use parley_persist::{ChatMessage, MessageRole};

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message_id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadataResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageMetadataResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
    pub total: u64,
}

/// List messages in a conversation
#[utoipa::path(
    get,
    path = "/conversations/{conversation_id}/messages",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID"),
        ("user_id" = String, Query, description = "Owning user"),
        ("limit" = Option<i64>, Query, description = "Maximum number of messages (default: 50)")
    ),
    responses(
        (status = 200, description = "List of messages", body = ListMessagesResponse),
        (status = 404, description = "Not found or access denied")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let limit = query.limit.min(200);

    let messages = state
        .orchestrator
        .list_messages(&conversation_id, &query.user_id, limit)
        .await?;
    let total = state
        .orchestrator
        .count_messages(&conversation_id, &query.user_id)
        .await?;

    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(message_to_response).collect(),
        total,
    }))
}

fn message_to_response(message: ChatMessage) -> MessageResponse {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    };

    MessageResponse {
        message_id: message.id,
        conversation_id: message.conversation_id,
        role: role.to_string(),
        content: message.content,
        created_at: message.created_at,
        metadata: message.metadata.map(|m| MessageMetadataResponse {
            token_count: m.token_count,
            model: m.model,
            latency_ms: m.latency_ms,
            error: m.error,
        }),
    }
}

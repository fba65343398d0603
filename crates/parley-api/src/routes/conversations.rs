use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use parley_persist::Conversation;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub user_id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub title: String,
    pub message_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTitleRequest {
    pub user_id: String,
    pub title: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateTitleResponse {
    pub title: String,
}

/// Create a new conversation
#[utoipa::path(
    post,
    path = "/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "conversations"
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<ConversationResponse>)> {
    let conversation = state
        .orchestrator
        .create_conversation(&req.user_id, req.organization_id, req.title)
        .await?;

    Ok((StatusCode::CREATED, Json(conversation_to_response(conversation))))
}

/// List conversations for a user
#[utoipa::path(
    get,
    path = "/conversations",
    params(
        ("user_id" = String, Query, description = "Owning user"),
        ("limit" = Option<i64>, Query, description = "Maximum number of conversations (default: 20)")
    ),
    responses(
        (status = 200, description = "List of conversations", body = ListConversationsResponse)
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListConversationsQuery>,
) -> ApiResult<Json<ListConversationsResponse>> {
    let limit = query.limit.min(100);

    let conversations = state
        .orchestrator
        .list_conversations(&query.user_id, limit)
        .await?;

    let has_more = conversations.len() as i64 == limit;
    let conversations = conversations
        .into_iter()
        .map(conversation_to_response)
        .collect();

    Ok(Json(ListConversationsResponse {
        conversations,
        has_more,
    }))
}

/// Get a specific conversation
#[utoipa::path(
    get,
    path = "/conversations/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID"),
        ("user_id" = String, Query, description = "Owning user")
    ),
    responses(
        (status = 200, description = "Conversation details", body = ConversationResponse),
        (status = 404, description = "Not found or access denied")
    ),
    tag = "conversations"
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Json<ConversationResponse>> {
    let conversation = state
        .orchestrator
        .get_conversation(&conversation_id, &query.user_id)
        .await?;

    Ok(Json(conversation_to_response(conversation)))
}

/// Delete a conversation (soft delete)
#[utoipa::path(
    delete,
    path = "/conversations/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID"),
        ("user_id" = String, Query, description = "Owning user")
    ),
    responses(
        (status = 204, description = "Conversation deleted"),
        (status = 404, description = "Not found or access denied")
    ),
    tag = "conversations"
)]
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<StatusCode> {
    state
        .orchestrator
        .delete_conversation(&conversation_id, &query.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Rename a conversation
#[utoipa::path(
    patch,
    path = "/conversations/{conversation_id}/title",
    request_body = UpdateTitleRequest,
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Title updated", body = UpdateTitleResponse),
        (status = 400, description = "Invalid title"),
        (status = 404, description = "Not found or access denied")
    ),
    tag = "conversations"
)]
pub async fn update_title(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(req): Json<UpdateTitleRequest>,
) -> ApiResult<Json<UpdateTitleResponse>> {
    let title = state
        .orchestrator
        .update_title(&conversation_id, &req.user_id, &req.title)
        .await?;

    Ok(Json(UpdateTitleResponse { title }))
}

fn conversation_to_response(conversation: Conversation) -> ConversationResponse {
    ConversationResponse {
        conversation_id: conversation.id,
        user_id: conversation.user_id,
        organization_id: conversation.organization_id,
        title: conversation.title,
        message_count: conversation.message_count,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    }
}

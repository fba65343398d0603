use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatMessage, Conversation, Organization, ThreadBinding, UserPreferences};

/// Changes applied to a conversation as part of one message turn
///
/// Always bumps `message_count` and `updated_at`; title and embedded binding
/// ride along when set.
#[derive(Debug, Clone, Default)]
pub struct TurnUpdate {
    pub set_title: Option<String>,
    pub set_binding: Option<ThreadBinding>,
}

/// Document-store operations the orchestrator depends on
///
/// Implemented by `StoreClient` against MongoDB; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, conversation: Conversation) -> Result<Conversation>;

    /// Point read; soft-deleted conversations read as absent
    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    async fn list_conversations(&self, user_id: &str, limit: i64) -> Result<Vec<Conversation>>;

    async fn soft_delete_conversation(&self, conversation_id: &str) -> Result<()>;

    async fn update_title(&self, conversation_id: &str, title: &str) -> Result<()>;

    async fn apply_turn(&self, conversation_id: &str, update: TurnUpdate) -> Result<()>;

    async fn set_thread_binding(
        &self,
        conversation_id: &str,
        binding: &ThreadBinding,
    ) -> Result<()>;

    async fn clear_thread_binding(&self, conversation_id: &str) -> Result<()>;

    async fn insert_message(&self, message: ChatMessage) -> Result<()>;

    /// Most recent messages in chronological order, soft-deleted excluded
    async fn list_recent_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>>;

    async fn count_messages(&self, conversation_id: &str) -> Result<u64>;

    async fn get_organization(&self, organization_id: &str) -> Result<Option<Organization>>;

    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>>;

    async fn upsert_preferences(&self, preferences: UserPreferences) -> Result<()>;
}

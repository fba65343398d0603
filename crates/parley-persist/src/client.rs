use async_trait::async_trait;
use mongodb::Client;

use crate::error::{Result, StoreError};
use crate::models::{ChatMessage, Conversation, Organization, ThreadBinding, UserPreferences};
use crate::repositories::{
    ConversationRepository, MessageRepository, OrganizationRepository, PreferencesRepository,
};
use crate::store::{ConversationStore, TurnUpdate};

pub struct StoreClient {
    conversation_repo: ConversationRepository,
    message_repo: MessageRepository,
    organization_repo: OrganizationRepository,
    preferences_repo: PreferencesRepository,
}

impl StoreClient {
    pub async fn new(mongodb_uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::debug!(database = %db_name, "Document store client ready");

        Ok(Self {
            conversation_repo: ConversationRepository::new(&client, db_name),
            message_repo: MessageRepository::new(&client, db_name),
            organization_repo: OrganizationRepository::new(&client, db_name),
            preferences_repo: PreferencesRepository::new(&client, db_name),
        })
    }

    pub fn builder() -> crate::builder::StoreClientBuilder {
        crate::builder::StoreClientBuilder::new()
    }

    pub fn conversations(&self) -> &ConversationRepository {
        &self.conversation_repo
    }

    pub fn messages(&self) -> &MessageRepository {
        &self.message_repo
    }

    pub fn organizations(&self) -> &OrganizationRepository {
        &self.organization_repo
    }

    pub fn preferences(&self) -> &PreferencesRepository {
        &self.preferences_repo
    }
}

#[async_trait]
impl ConversationStore for StoreClient {
    async fn create_conversation(&self, conversation: Conversation) -> Result<Conversation> {
        self.conversation_repo.create(&conversation).await?;
        Ok(conversation)
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        self.conversation_repo.get(conversation_id).await
    }

    async fn list_conversations(&self, user_id: &str, limit: i64) -> Result<Vec<Conversation>> {
        self.conversation_repo.list_for_user(user_id, limit).await
    }

    async fn soft_delete_conversation(&self, conversation_id: &str) -> Result<()> {
        self.conversation_repo.soft_delete(conversation_id).await
    }

    async fn update_title(&self, conversation_id: &str, title: &str) -> Result<()> {
        self.conversation_repo.update_title(conversation_id, title).await
    }

    async fn apply_turn(&self, conversation_id: &str, update: TurnUpdate) -> Result<()> {
        self.conversation_repo.apply_turn(conversation_id, update).await
    }

    async fn set_thread_binding(
        &self,
        conversation_id: &str,
        binding: &ThreadBinding,
    ) -> Result<()> {
        self.conversation_repo
            .set_thread_binding(conversation_id, binding)
            .await
    }

    async fn clear_thread_binding(&self, conversation_id: &str) -> Result<()> {
        self.conversation_repo.clear_thread_binding(conversation_id).await
    }

    async fn insert_message(&self, message: ChatMessage) -> Result<()> {
        self.message_repo.insert(&message).await
    }

    async fn list_recent_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>> {
        self.message_repo.list_recent(conversation_id, limit).await
    }

    async fn count_messages(&self, conversation_id: &str) -> Result<u64> {
        self.message_repo.count(conversation_id).await
    }

    async fn get_organization(&self, organization_id: &str) -> Result<Option<Organization>> {
        self.organization_repo.get(organization_id).await
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        self.preferences_repo.get(user_id).await
    }

    async fn upsert_preferences(&self, preferences: UserPreferences) -> Result<()> {
        self.preferences_repo.upsert(&preferences).await
    }
}

use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::error::Result;
use crate::models::{Conversation, ThreadBinding};
use crate::store::TurnUpdate;

#[derive(Clone)]
pub struct ConversationRepository {
    collection: Collection<Conversation>,
}

impl ConversationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("conversations");
        Self { collection }
    }

    pub async fn create(&self, conversation: &Conversation) -> Result<()> {
        self.collection.insert_one(conversation).await?;
        Ok(())
    }

    /// Get a conversation by id, soft-deleted records excluded
    pub async fn get(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let filter = doc! { "_id": conversation_id, "is_deleted": false };
        Ok(self.collection.find_one(filter).await?)
    }

    /// List a user's conversations, most recently updated first
    pub async fn list_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Conversation>> {
        let filter = doc! { "user_id": user_id, "is_deleted": false };
        let conversations = self
            .collection
            .find(filter)
            .sort(doc! { "updated_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(conversations)
    }

    /// Flip the soft-delete flag; the document stays in place
    pub async fn soft_delete(&self, conversation_id: &str) -> Result<()> {
        let filter = doc! { "_id": conversation_id };
        let update = doc! {
            "$set": {
                "is_deleted": true,
                "updated_at": bson::to_bson(&chrono::Utc::now())?,
            }
        };
        self.collection.update_one(filter, update).await?;
        Ok(())
    }

    pub async fn update_title(&self, conversation_id: &str, title: &str) -> Result<()> {
        let filter = doc! { "_id": conversation_id, "is_deleted": false };
        let update = doc! {
            "$set": {
                "title": title,
                "updated_at": bson::to_bson(&chrono::Utc::now())?,
            }
        };
        self.collection.update_one(filter, update).await?;
        Ok(())
    }

    /// Apply one message turn in a single update
    ///
    /// Bumps the message count and timestamp, and optionally sets the title
    /// and/or the embedded thread binding alongside.
    pub async fn apply_turn(&self, conversation_id: &str, update: TurnUpdate) -> Result<()> {
        let filter = doc! { "_id": conversation_id, "is_deleted": false };

        let mut set = doc! { "updated_at": bson::to_bson(&chrono::Utc::now())? };
        if let Some(title) = update.set_title {
            set.insert("title", title);
        }
        if let Some(binding) = update.set_binding {
            set.insert("thread_binding", bson::to_bson(&binding)?);
        }

        let update = doc! {
            "$inc": { "message_count": 1 },
            "$set": set,
        };
        self.collection.update_one(filter, update).await?;
        Ok(())
    }

    pub async fn set_thread_binding(
        &self,
        conversation_id: &str,
        binding: &ThreadBinding,
    ) -> Result<()> {
        let filter = doc! { "_id": conversation_id };
        let update = doc! { "$set": { "thread_binding": bson::to_bson(binding)? } };
        self.collection.update_one(filter, update).await?;
        Ok(())
    }

    pub async fn clear_thread_binding(&self, conversation_id: &str) -> Result<()> {
        let filter = doc! { "_id": conversation_id };
        let update = doc! { "$unset": { "thread_binding": "" } };
        self.collection.update_one(filter, update).await?;
        Ok(())
    }
}

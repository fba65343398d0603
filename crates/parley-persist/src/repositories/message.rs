use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::error::Result;
use crate::models::ChatMessage;

#[derive(Clone)]
pub struct MessageRepository {
    collection: Collection<ChatMessage>,
}

impl MessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn insert(&self, message: &ChatMessage) -> Result<()> {
        self.collection.insert_one(message).await?;
        Ok(())
    }

    /// The most recent messages of a conversation, in chronological order
    pub async fn list_recent(&self, conversation_id: &str, limit: i64) -> Result<Vec<ChatMessage>> {
        let filter = doc! { "conversation_id": conversation_id, "is_deleted": false };
        let mut messages: Vec<ChatMessage> = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        messages.reverse();
        Ok(messages)
    }

    pub async fn count(&self, conversation_id: &str) -> Result<u64> {
        let filter = doc! { "conversation_id": conversation_id, "is_deleted": false };
        Ok(self.collection.count_documents(filter).await?)
    }
}

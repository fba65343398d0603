use mongodb::{bson::doc, Client, Collection};

use crate::error::Result;
use crate::models::UserPreferences;

#[derive(Clone)]
pub struct PreferencesRepository {
    collection: Collection<UserPreferences>,
}

impl PreferencesRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("preferences");
        Self { collection }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        let filter = doc! { "_id": user_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Insert-or-replace the user's preference document
    pub async fn upsert(&self, preferences: &UserPreferences) -> Result<()> {
        let filter = doc! { "_id": &preferences.user_id };

        // _id comes from the filter; it cannot appear in a $set
        let mut fields = bson::to_document(preferences)?;
        fields.remove("_id");

        let update = doc! { "$set": fields };
        self.collection
            .update_one(filter, update)
            .upsert(true)
            .await?;
        Ok(())
    }
}

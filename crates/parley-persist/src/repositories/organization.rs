use mongodb::{bson::doc, Client, Collection};

use crate::error::Result;
use crate::models::Organization;

#[derive(Clone)]
pub struct OrganizationRepository {
    collection: Collection<Organization>,
}

impl OrganizationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("organizations");
        Self { collection }
    }

    pub async fn get(&self, organization_id: &str) -> Result<Option<Organization>> {
        let filter = doc! { "_id": organization_id };
        Ok(self.collection.find_one(filter).await?)
    }
}

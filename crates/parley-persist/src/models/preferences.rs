use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user UI/model preferences, upsert-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(rename = "_id")]
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            theme: None,
            model: None,
            updated_at: Utc::now(),
        }
    }
}

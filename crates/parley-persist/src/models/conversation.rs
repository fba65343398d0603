use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of a thread binding
pub const DEFAULT_THREAD_TTL_HOURS: i64 = 24;

/// A titled sequence of messages owned by one user
///
/// Conversations are soft-deleted: `is_deleted` is flipped and every read path
/// filters on it, the document is never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    pub title: String,
    pub message_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Active agent-thread binding, when the embedded cache backend is in use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_binding: Option<ThreadBinding>,
}

impl Conversation {
    pub fn new(user_id: impl Into<String>, organization_id: Option<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            organization_id,
            title: title.into(),
            message_count: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
            thread_binding: None,
        }
    }
}

/// Record binding a conversation to an ephemeral agent thread
///
/// The thread identifier is generated locally and only resolves inside the
/// gateway instance that created it; the binding records which handle to try,
/// not a resumable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadBinding {
    pub conversation_id: String,
    pub thread_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ThreadBinding {
    pub fn new(conversation_id: impl Into<String>, thread_id: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            thread_id: thread_id.into(),
            created_at: now,
            expires_at: now + ttl,
            is_active: true,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_active || now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_binding_is_not_expired() {
        let binding = ThreadBinding::new("c1", "t1", Duration::hours(DEFAULT_THREAD_TTL_HOURS));
        assert!(!binding.is_expired(Utc::now()));
    }

    #[test]
    fn binding_expires_after_ttl() {
        let binding = ThreadBinding::new("c1", "t1", Duration::hours(1));
        assert!(binding.is_expired(Utc::now() + Duration::hours(2)));
    }

    #[test]
    fn inactive_binding_counts_as_expired() {
        let mut binding = ThreadBinding::new("c1", "t1", Duration::hours(1));
        binding.is_active = false;
        assert!(binding.is_expired(Utc::now()));
    }

    #[test]
    fn conversation_roundtrips_through_json() {
        let mut conversation = Conversation::new("user-1", Some("org-1".to_string()), "Hello");
        conversation.thread_binding = Some(ThreadBinding::new(
            conversation.id.clone(),
            "t1",
            Duration::hours(DEFAULT_THREAD_TTL_HOURS),
        ));

        let json = serde_json::to_string(&conversation).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, conversation.id);
        assert_eq!(back.thread_binding, conversation.thread_binding);
        assert!(json.contains("\"_id\""));
    }
}

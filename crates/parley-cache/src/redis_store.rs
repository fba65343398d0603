use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::ThreadStateStore;
use parley_persist::ThreadBinding;

const KEY_PREFIX: &str = "parley:thread:";

/// Distributed thread-state store on Redis
///
/// The binding is stored as a flat JSON record under `parley:thread:{id}`
/// with a native key TTL derived from the binding's expiry, so the cache
/// evicts on its own even if no reader comes back.
pub struct RedisThreadStateStore {
    conn: ConnectionManager,
}

impl RedisThreadStateStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    fn key(conversation_id: &str) -> String {
        format!("{}{}", KEY_PREFIX, conversation_id)
    }
}

#[async_trait]
impl ThreadStateStore for RedisThreadStateStore {
    async fn get(&self, conversation_id: &str) -> Option<ThreadBinding> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = match conn.get(Self::key(conversation_id)).await {
            Ok(raw) => raw,
            Err(e) => {
                // Fail open: an unreachable cache means "no cached thread"
                tracing::warn!(conversation_id = %conversation_id, error = %e, "Thread-state cache read failed");
                return None;
            }
        };

        let binding: ThreadBinding = match raw.as_deref().map(serde_json::from_str) {
            Some(Ok(binding)) => binding,
            Some(Err(e)) => {
                tracing::warn!(conversation_id = %conversation_id, error = %e, "Corrupt thread binding evicted");
                self.remove(conversation_id).await;
                return None;
            }
            None => return None,
        };

        if binding.is_expired(Utc::now()) {
            self.remove(conversation_id).await;
            return None;
        }

        Some(binding)
    }

    async fn set(&self, binding: ThreadBinding) {
        let mut conn = self.conn.clone();

        let ttl_secs = (binding.expires_at - Utc::now()).num_seconds().max(1) as u64;
        let payload = match serde_json::to_string(&binding) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(conversation_id = %binding.conversation_id, error = %e, "Failed to serialize thread binding");
                return;
            }
        };

        if let Err(e) = conn
            .set_ex::<_, _, ()>(Self::key(&binding.conversation_id), payload, ttl_secs)
            .await
        {
            tracing::warn!(conversation_id = %binding.conversation_id, error = %e, "Thread-state cache write failed");
        }
    }

    async fn remove(&self, conversation_id: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(Self::key(conversation_id)).await {
            tracing::warn!(conversation_id = %conversation_id, error = %e, "Thread-state cache delete failed");
        }
    }

    async fn exists(&self, conversation_id: &str) -> bool {
        self.get(conversation_id).await.is_some()
    }
}

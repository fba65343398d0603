use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::ThreadStateStore;
use parley_persist::ThreadBinding;

/// Process-local thread-state store
///
/// A mutex-guarded map owned by this component and injected where needed.
/// Bindings disappear on restart, which is acceptable: threads themselves do
/// not survive a restart either.
pub struct MemoryThreadStateStore {
    inner: Mutex<HashMap<String, ThreadBinding>>,
}

impl MemoryThreadStateStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryThreadStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadStateStore for MemoryThreadStateStore {
    async fn get(&self, conversation_id: &str) -> Option<ThreadBinding> {
        let mut map = self.inner.lock().await;

        match map.get(conversation_id) {
            Some(binding) if binding.is_expired(Utc::now()) => {
                map.remove(conversation_id);
                tracing::debug!(conversation_id = %conversation_id, "Evicted expired thread binding");
                None
            }
            Some(binding) => Some(binding.clone()),
            None => None,
        }
    }

    async fn set(&self, binding: ThreadBinding) {
        self.inner
            .lock()
            .await
            .insert(binding.conversation_id.clone(), binding);
    }

    async fn remove(&self, conversation_id: &str) {
        self.inner.lock().await.remove(conversation_id);
    }

    async fn exists(&self, conversation_id: &str) -> bool {
        self.get(conversation_id).await.is_some()
    }
}

use async_trait::async_trait;

use crate::ThreadStateStore;
use parley_persist::ThreadBinding;

/// Store variant for bindings embedded in the conversation record
///
/// All operations are no-ops: the orchestrator already holds the conversation
/// document and reads/writes the binding there, so a separate cache round-trip
/// would be redundant. `authoritative()` is false so callers know to pass
/// binding state through the conversation object.
pub struct EmbeddedThreadStateStore;

impl EmbeddedThreadStateStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmbeddedThreadStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadStateStore for EmbeddedThreadStateStore {
    async fn get(&self, _conversation_id: &str) -> Option<ThreadBinding> {
        None
    }

    async fn set(&self, _binding: ThreadBinding) {}

    async fn remove(&self, _conversation_id: &str) {}

    async fn exists(&self, _conversation_id: &str) -> bool {
        false
    }

    fn authoritative(&self) -> bool {
        false
    }
}

mod embedded;
mod memory;
mod redis_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use parley_persist::ThreadBinding;

pub use embedded::EmbeddedThreadStateStore;
pub use memory::MemoryThreadStateStore;
pub use redis_store::RedisThreadStateStore;

/// Cache of conversation-to-agent-thread bindings
///
/// Reads fail open: a backend failure or an expired binding both read as
/// absent, so the caller falls back to creating a fresh thread instead of
/// blocking the user. Writes are last-writer-wins; a conversation is operated
/// on by at most one streaming call at a time under normal use.
#[async_trait]
pub trait ThreadStateStore: Send + Sync {
    /// Look up the binding for a conversation
    ///
    /// Expired bindings read as absent and are proactively evicted.
    async fn get(&self, conversation_id: &str) -> Option<ThreadBinding>;

    /// Store a binding, overwriting any existing one for the conversation
    async fn set(&self, binding: ThreadBinding);

    async fn remove(&self, conversation_id: &str);

    async fn exists(&self, conversation_id: &str) -> bool;

    /// Whether this store holds binding state itself
    ///
    /// The embedded backend returns false: the binding travels inside the
    /// conversation record and callers must read/write it there.
    fn authoritative(&self) -> bool {
        true
    }
}

/// Which backend holds thread-state bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map; ephemeral across restarts, single-instance only
    Memory,
    /// Distributed cache with native per-key TTL, for multi-instance deployments
    Redis,
    /// Binding embedded in the conversation record, no separate cache
    Embedded,
}

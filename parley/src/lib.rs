//! # Parley - Multi-tenant AI Chat Backend
//!
//! Parley is the conversation layer of a multi-tenant AI chat application:
//! - 🚀 **Real-time streaming** (token-by-token responses fanned out while being persisted)
//! - 🧵 **Thread bindings** (conversations mapped to ephemeral agent threads with TTL)
//! - 💾 **Pluggable thread-state cache** (in-process, Redis, or embedded in the record)
//! - 📏 **Deterministic context budgeting** (pure token estimation and trimming)
//! - ⚡ **Async/await** (built on Tokio for scalability)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let chat = ChatBuilder::new()
//!         .mongodb("mongodb://localhost:27017", "parley")
//!         .agent_key("sk-...")
//!         .build()
//!         .await?;
//!
//!     let conversation = chat.create_conversation("user-1", None, None).await?;
//!
//!     let mut rx = chat.send_message_streaming(
//!         conversation.id.clone(),
//!         "user-1",
//!         "Hello!",
//!         CancellationToken::new(),
//!     );
//!
//!     while let Some(chunk) = rx.recv().await {
//!         print!("{}", chunk.content);
//!         if chunk.is_complete {
//!             break;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Parley consists of several composable crates:
//!
//! - **parley-agent**: agent runtime gateway, process-local thread handles
//! - **parley-persist**: MongoDB persistence (conversations, messages, tenants)
//! - **parley-cache**: thread-state cache with memory/Redis/embedded backends
//! - **parley-context**: deterministic context-window policy
//! - **parley-chat**: the conversation orchestrator and streaming pipeline
//!
//! For a complete REST API with SSE streaming, see the `parley-api` crate in
//! the repository.

// Re-export all public APIs
pub use parley_agent as agent;
pub use parley_cache as cache;
pub use parley_chat as chat;
pub use parley_context as context;
pub use parley_persist as persist;

// Re-export commonly used types
pub use parley_agent::{AgentConfig, AgentGateway, GatewayRegistry};
pub use parley_cache::{CacheBackend, ThreadStateStore};
pub use parley_chat::{ChatLimits, ConversationOrchestrator, ResponseChunk};
pub use parley_context::ContextWindowPolicy;
pub use parley_persist::{ChatMessage, Conversation, StoreClient, ThreadBinding};

/// High-level builder wiring the whole chat stack together
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::ChatBuilder;
    pub use crate::{ChatLimits, ContextWindowPolicy, ConversationOrchestrator, ResponseChunk};
    pub use anyhow::Result;
}

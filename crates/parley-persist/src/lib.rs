pub mod builder;
pub mod client;
pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use builder::StoreClientBuilder;
pub use client::StoreClient;
pub use error::{Result, StoreError};
pub use models::{
    ChatMessage, Conversation, MessageMetadata, MessageRole, Organization, ThreadBinding,
    UserPreferences, DEFAULT_THREAD_TTL_HOURS,
};
pub use store::{ConversationStore, TurnUpdate};

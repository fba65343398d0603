mod conversation;
mod message;
mod organization;
mod preferences;

pub use conversation::{Conversation, ThreadBinding, DEFAULT_THREAD_TTL_HOURS};
pub use message::{ChatMessage, MessageMetadata, MessageRole};
pub use organization::Organization;
pub use preferences::UserPreferences;

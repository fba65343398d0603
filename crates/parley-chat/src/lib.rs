pub mod chunk;
pub mod error;
pub mod limits;
pub mod orchestrator;
pub mod sanitize;

pub use chunk::ResponseChunk;
pub use error::ChatError;
pub use limits::ChatLimits;
pub use orchestrator::{ConversationOrchestrator, ASSISTANT_APOLOGY};
pub use sanitize::{sanitize, SanitizedMessage};

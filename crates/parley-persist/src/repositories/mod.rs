mod conversation;
mod message;
mod organization;
mod preferences;

pub use conversation::ConversationRepository;
pub use message::MessageRepository;
pub use organization::OrganizationRepository;
pub use preferences::PreferencesRepository;

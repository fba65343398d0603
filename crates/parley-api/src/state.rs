use std::sync::Arc;

use parley_chat::ConversationOrchestrator;
use parley_persist::ConversationStore;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// All resources are wrapped in Arc for efficient sharing across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub store: Arc<dyn ConversationStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<ConversationOrchestrator>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator,
            store,
        }
    }
}

//! High-level builder API for wiring the chat stack

use std::sync::Arc;

use anyhow::{Context, Result};

use parley_agent::{AgentConfig, GatewayRegistry, HttpRuntimeFactory};
use parley_cache::{
    CacheBackend, EmbeddedThreadStateStore, MemoryThreadStateStore, RedisThreadStateStore,
    ThreadStateStore,
};
use parley_chat::{ChatLimits, ConversationOrchestrator};
use parley_context::ContextWindowPolicy;
use parley_persist::{ConversationStore, StoreClient};

/// High-level builder for the conversation orchestrator
///
/// # Example
///
/// ```rust,no_run
/// use parley::prelude::*;
/// use parley::CacheBackend;
///
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let chat = ChatBuilder::new()
///     .mongodb("mongodb://localhost:27017", "parley")
///     .agent_key("sk-...")
///     .model("gpt-4o")
///     .cache_backend(CacheBackend::Memory)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatBuilder {
    // MongoDB
    mongodb_uri: Option<String>,
    database: Option<String>,

    // Agent runtime
    agent_key: Option<String>,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    instructions: String,

    // Thread-state cache
    cache_backend: CacheBackend,
    redis_url: Option<String>,

    // Pipeline limits
    limits: ChatLimits,
}

impl Default for ChatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            mongodb_uri: None,
            database: None,
            agent_key: None,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            instructions: "You are a helpful assistant.".to_string(),
            cache_backend: CacheBackend::Memory,
            redis_url: None,
            limits: ChatLimits::default(),
        }
    }

    pub fn mongodb(mut self, uri: impl Into<String>, database: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self.database = Some(database.into());
        self
    }

    pub fn agent_key(mut self, key: impl Into<String>) -> Self {
        self.agent_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache_backend = backend;
        self
    }

    /// Required when the cache backend is [`CacheBackend::Redis`]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn limits(mut self, limits: ChatLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Wire everything together
    pub async fn build(self) -> Result<Arc<ConversationOrchestrator>> {
        let mongodb_uri = self.mongodb_uri.context("mongodb uri is required")?;
        let database = self.database.context("database name is required")?;
        let agent_key = self.agent_key.context("agent api key is required")?;

        let store = StoreClient::builder()
            .mongodb_uri(&mongodb_uri)
            .database(&database)
            .build()
            .await?;
        let store: Arc<dyn ConversationStore> = Arc::new(store);

        let cache: Arc<dyn ThreadStateStore> = match self.cache_backend {
            CacheBackend::Memory => Arc::new(MemoryThreadStateStore::new()),
            CacheBackend::Embedded => Arc::new(EmbeddedThreadStateStore::new()),
            CacheBackend::Redis => {
                let url = self
                    .redis_url
                    .context("redis url is required for the redis cache backend")?;
                Arc::new(RedisThreadStateStore::connect(&url).await?)
            }
        };

        let config = AgentConfig {
            endpoint: self.endpoint,
            model: self.model,
            temperature: self.temperature,
            instructions: self.instructions,
        };
        let registry = GatewayRegistry::new(config, Arc::new(HttpRuntimeFactory::new(agent_key)))?;

        Ok(Arc::new(ConversationOrchestrator::new(
            store,
            cache,
            Arc::new(registry),
            ContextWindowPolicy::default(),
            self.limits,
        )))
    }
}

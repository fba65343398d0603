use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use parley_cache::CacheBackend;
use parley_chat::ChatLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub agent: AgentSettings,
    pub cache: CacheSettings,
    pub chat: ChatSettings,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub agent_api_key: String,
    #[serde(default)]
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
    pub pool_size: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub instructions: String,
}

impl From<&AgentSettings> for parley_agent::AgentConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            instructions: settings.instructions.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    pub max_message_len: usize,
    pub hard_ceiling: usize,
    pub token_budget: usize,
    pub trim_target: usize,
    pub title_max_len: usize,
    pub history_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (with SERVER_, MONGODB_, AGENT_, etc. prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .prefix("SERVER")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("MONGODB")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("AGENT")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("CACHE")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("LOG")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
            ConfigError::Message("MONGODB_URI environment variable is required".to_string())
        })?;
        cfg.agent_api_key = std::env::var("AGENT_API_KEY").map_err(|_| {
            ConfigError::Message("AGENT_API_KEY environment variable is required".to_string())
        })?;
        cfg.redis_url = std::env::var("REDIS_URL").ok();

        if cfg.cache.backend == CacheBackend::Redis && cfg.redis_url.is_none() {
            return Err(ConfigError::Message(
                "REDIS_URL is required when cache.backend is \"redis\"".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Resource limits for the send pipeline
    pub fn chat_limits(&self) -> ChatLimits {
        ChatLimits {
            max_message_len: self.chat.max_message_len,
            hard_ceiling: self.chat.hard_ceiling,
            token_budget: self.chat.token_budget,
            trim_target: self.chat.trim_target,
            title_max_len: self.chat.title_max_len,
            history_limit: self.chat.history_limit,
            thread_ttl: chrono::Duration::hours(self.cache.ttl_hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000
            workers = 4

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [mongodb]
            database = "parley_test"
            pool_size = 5
            timeout_ms = 3000

            [agent]
            endpoint = "https://api.openai.com/v1"
            model = "gpt-4o-mini"
            temperature = 0.5
            instructions = "You are a helpful assistant."

            [cache]
            backend = "memory"
            ttl_hours = 24

            [chat]
            max_message_len = 10000
            hard_ceiling = 32000
            token_budget = 6000
            trim_target = 4000
            title_max_len = 50
            history_limit = 100

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.mongodb.database, "parley_test");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.chat.max_message_len, 10_000);

        let limits = config.chat_limits();
        assert_eq!(limits.hard_ceiling, 32_000);
        assert_eq!(limits.thread_ttl, chrono::Duration::hours(24));
    }
}

use crate::streaming::FragmentStream;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a message sent to the agent runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    System,
    User,
    Assistant,
}

/// A single message in the runtime wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: AgentRole,
    pub content: String,
}

impl AgentMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: AgentRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: AgentRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: AgentRole::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request against the agent runtime
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<AgentMessage>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<AgentMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Low-level agent runtime client
///
/// Implementations wrap a concrete runtime endpoint. The gateway layers thread
/// handles and history replay on top of this.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Cheap connectivity/credentials check, called once by `AgentGateway::initialize`
    async fn ping(&self) -> Result<()>;

    /// Non-streaming completion, returns the full assistant text
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Streaming completion, yields incremental text fragments
    async fn complete_stream(&self, request: CompletionRequest) -> Result<FragmentStream>;
}

/// Configuration for one gateway instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub instructions: String,
}

impl AgentConfig {
    /// Apply a per-organization override on top of this config
    pub fn with_tuning(&self, tuning: &AgentTuning) -> Self {
        Self {
            endpoint: tuning.endpoint.clone().unwrap_or_else(|| self.endpoint.clone()),
            model: tuning.model.clone().unwrap_or_else(|| self.model.clone()),
            temperature: self.temperature,
            instructions: tuning
                .instructions
                .clone()
                .unwrap_or_else(|| self.instructions.clone()),
        }
    }
}

/// Per-organization agent overrides, stored on the organization record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentTuning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_overrides_model_and_keeps_the_rest() {
        let base = AgentConfig {
            endpoint: "https://api.example.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.2),
            instructions: "You are a helpful assistant.".to_string(),
        };

        let tuned = base.with_tuning(&AgentTuning {
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        });

        assert_eq!(tuned.model, "gpt-4o");
        assert_eq!(tuned.endpoint, base.endpoint);
        assert_eq!(tuned.instructions, base.instructions);
    }
}

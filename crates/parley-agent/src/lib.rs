pub mod client;
pub mod gateway;
pub mod registry;
pub mod streaming;
pub mod types;

pub use client::AssistantClient;
pub use gateway::{AgentGateway, AgentThread};
pub use registry::{GatewayRegistry, HttpRuntimeFactory, RuntimeFactory};
pub use streaming::{parse_fragment_stream, FragmentStream};
pub use types::{AgentConfig, AgentMessage, AgentRole, AgentRuntime, AgentTuning, CompletionRequest};

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::client::AssistantClient;
use crate::gateway::AgentGateway;
use crate::types::{AgentConfig, AgentRuntime, AgentTuning};

/// Creates runtime clients for gateway instances
///
/// A seam between the registry and the concrete transport so tests can
/// substitute a scripted runtime.
pub trait RuntimeFactory: Send + Sync {
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn AgentRuntime>>;
}

/// Production factory building HTTP runtime clients
pub struct HttpRuntimeFactory {
    api_key: String,
}

impl HttpRuntimeFactory {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl RuntimeFactory for HttpRuntimeFactory {
    fn create(&self, config: &AgentConfig) -> Result<Arc<dyn AgentRuntime>> {
        Ok(Arc::new(AssistantClient::new(
            &config.endpoint,
            &self.api_key,
        )?))
    }
}

/// Keyed registry of gateways, one per organization override
///
/// Organizations without an override share the default gateway. Per-org
/// gateways are created lazily and memoized; the map is explicit state owned
/// here, never ambient.
pub struct GatewayRegistry {
    config: AgentConfig,
    factory: Arc<dyn RuntimeFactory>,
    default_gateway: Arc<AgentGateway>,
    overrides: Mutex<HashMap<String, Arc<AgentGateway>>>,
}

impl GatewayRegistry {
    pub fn new(config: AgentConfig, factory: Arc<dyn RuntimeFactory>) -> Result<Self> {
        let runtime = factory.create(&config)?;
        let default_gateway = Arc::new(AgentGateway::new(runtime, config.clone()));

        Ok(Self {
            config,
            factory,
            default_gateway,
            overrides: Mutex::new(HashMap::new()),
        })
    }

    /// The shared gateway used when no organization override applies
    pub fn default_gateway(&self) -> Arc<AgentGateway> {
        Arc::clone(&self.default_gateway)
    }

    /// Resolve the gateway for an organization
    ///
    /// `tuning` is the organization's stored override, if any; without one the
    /// shared default gateway is returned. Override gateways are built on
    /// first use and reused afterwards, so repeated resolution is cheap.
    pub async fn resolve(
        &self,
        organization_id: Option<&str>,
        tuning: Option<&AgentTuning>,
    ) -> Result<Arc<AgentGateway>> {
        let (org_id, tuning) = match (organization_id, tuning) {
            (Some(org_id), Some(tuning)) => (org_id, tuning),
            _ => return Ok(self.default_gateway()),
        };

        let mut overrides = self.overrides.lock().await;
        if let Some(gateway) = overrides.get(org_id) {
            return Ok(Arc::clone(gateway));
        }

        let config = self.config.with_tuning(tuning);
        let runtime = self.factory.create(&config)?;
        let gateway = Arc::new(AgentGateway::new(runtime, config));
        overrides.insert(org_id.to_string(), Arc::clone(&gateway));

        tracing::info!(organization_id = %org_id, model = %gateway.model(), "Created organization gateway");
        Ok(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::FragmentStream;
    use crate::types::CompletionRequest;
    use async_trait::async_trait;

    struct NullRuntime;

    #[async_trait]
    impl AgentRuntime for NullRuntime {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<String> {
            Ok(String::new())
        }

        async fn complete_stream(&self, _request: CompletionRequest) -> Result<FragmentStream> {
            Ok(Box::pin(futures::stream::empty::<Result<String>>()))
        }
    }

    struct NullFactory;

    impl RuntimeFactory for NullFactory {
        fn create(&self, _config: &AgentConfig) -> Result<Arc<dyn AgentRuntime>> {
            Ok(Arc::new(NullRuntime))
        }
    }

    fn registry() -> GatewayRegistry {
        let config = AgentConfig {
            endpoint: "https://api.example.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            instructions: "You are a helpful assistant.".to_string(),
        };
        GatewayRegistry::new(config, Arc::new(NullFactory)).unwrap()
    }

    #[tokio::test]
    async fn no_override_resolves_to_shared_default() {
        let registry = registry();

        let a = registry.resolve(None, None).await.unwrap();
        let b = registry.resolve(Some("org-1"), None).await.unwrap();

        assert!(Arc::ptr_eq(&a, &registry.default_gateway()));
        assert!(Arc::ptr_eq(&b, &registry.default_gateway()));
    }

    #[tokio::test]
    async fn override_gateway_is_memoized_per_org() {
        let registry = registry();
        let tuning = AgentTuning {
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        };

        let first = registry.resolve(Some("org-1"), Some(&tuning)).await.unwrap();
        let second = registry.resolve(Some("org-1"), Some(&tuning)).await.unwrap();
        let other = registry.resolve(Some("org-2"), Some(&tuning)).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert!(!Arc::ptr_eq(&first, &registry.default_gateway()));
        assert_eq!(first.model(), "gpt-4o");
    }
}

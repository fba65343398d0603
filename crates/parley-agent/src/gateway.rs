use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::streaming::FragmentStream;
use crate::types::{AgentConfig, AgentMessage, AgentRuntime, CompletionRequest};

/// A live agent execution thread
///
/// Holds the replayed conversation history in process memory. A thread is only
/// valid inside the gateway instance that created it: the identifier is
/// generated locally and cannot be used to rehydrate the history from the
/// runtime after a restart.
pub struct AgentThread {
    pub id: String,
    history: Mutex<Vec<AgentMessage>>,
}

impl AgentThread {
    fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }
}

/// Gateway around an agent runtime
///
/// Owns thread handles, replays their history on every run, and guards
/// initialization so the runtime identity is established at most once even
/// under concurrent first callers.
pub struct AgentGateway {
    runtime: Arc<dyn AgentRuntime>,
    config: AgentConfig,
    threads: Mutex<HashMap<String, Arc<AgentThread>>>,
    init: Mutex<bool>,
}

impl AgentGateway {
    pub fn new(runtime: Arc<dyn AgentRuntime>, config: AgentConfig) -> Self {
        Self {
            runtime,
            config,
            threads: Mutex::new(HashMap::new()),
            init: Mutex::new(false),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Establish the runtime connection, at most once
    ///
    /// Concurrent callers serialize on the gate; callers arriving after a
    /// successful initialization return immediately.
    pub async fn initialize(&self) -> Result<()> {
        let mut initialized = self.init.lock().await;
        if *initialized {
            return Ok(());
        }

        self.runtime.ping().await?;
        *initialized = true;

        tracing::info!(model = %self.config.model, "Agent gateway initialized");
        Ok(())
    }

    /// Create a fresh thread handle with no prior context
    pub async fn new_thread(&self) -> Arc<AgentThread> {
        let thread = Arc::new(AgentThread::new());
        self.threads
            .lock()
            .await
            .insert(thread.id.clone(), Arc::clone(&thread));

        tracing::debug!(thread_id = %thread.id, "Created agent thread");
        thread
    }

    /// Resolve a live thread handle by identifier
    ///
    /// Returns `None` for identifiers created by another instance or before a
    /// restart; those threads cannot be reconstructed.
    pub async fn thread(&self, thread_id: &str) -> Option<Arc<AgentThread>> {
        self.threads.lock().await.get(thread_id).cloned()
    }

    /// Drop a thread handle and its in-memory history
    pub async fn release(&self, thread_id: &str) {
        if self.threads.lock().await.remove(thread_id).is_some() {
            tracing::debug!(thread_id = %thread_id, "Released agent thread");
        }
    }

    fn build_request(&self, history: &[AgentMessage], user_text: &str) -> CompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(AgentMessage::system(&self.config.instructions));
        messages.extend_from_slice(history);
        messages.push(AgentMessage::user(user_text));

        let mut request = CompletionRequest::new(&self.config.model, messages);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Non-streaming run on a thread
    pub async fn run(&self, thread: &Arc<AgentThread>, user_text: &str) -> Result<String> {
        self.initialize().await?;

        let request = {
            let history = thread.history.lock().await;
            self.build_request(&history, user_text)
        };

        let reply = self.runtime.complete(request).await?;

        let mut history = thread.history.lock().await;
        history.push(AgentMessage::user(user_text));
        history.push(AgentMessage::assistant(&reply));

        Ok(reply)
    }

    /// Streaming run on a thread
    ///
    /// Fragments are yielded as they arrive. The completed exchange is appended
    /// to the thread history only when the stream finishes; a dropped or failed
    /// stream leaves the history untouched.
    pub async fn run_streaming(
        &self,
        thread: &Arc<AgentThread>,
        user_text: &str,
    ) -> Result<FragmentStream> {
        self.initialize().await?;

        let request = {
            let history = thread.history.lock().await;
            self.build_request(&history, user_text)
        };

        let inner = self.runtime.complete_stream(request).await?;
        let thread = Arc::clone(thread);
        let user_text = user_text.to_string();

        Ok(Box::pin(async_stream::stream! {
            let mut inner = inner;
            let mut accumulated = String::new();
            let mut failed = false;

            while let Some(fragment) = inner.next().await {
                match fragment {
                    Ok(text) => {
                        accumulated.push_str(&text);
                        yield Ok(text);
                    }
                    Err(e) => {
                        failed = true;
                        yield Err(e);
                        break;
                    }
                }
            }

            if !failed {
                let mut history = thread.history.lock().await;
                history.push(AgentMessage::user(user_text));
                history.push(AgentMessage::assistant(accumulated));
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRuntime {
        pings: AtomicUsize,
    }

    #[async_trait]
    impl AgentRuntime for CountingRuntime {
        async fn ping(&self) -> Result<()> {
            self.pings.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<String> {
            Ok("ok".to_string())
        }

        async fn complete_stream(&self, _request: CompletionRequest) -> Result<FragmentStream> {
            let fragments: Vec<Result<String>> = vec![Ok("ok".to_string())];
            Ok(Box::pin(futures::stream::iter(fragments)))
        }
    }

    fn test_config() -> AgentConfig {
        AgentConfig {
            endpoint: "https://api.example.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            instructions: "You are a helpful assistant.".to_string(),
        }
    }

    fn counting_gateway() -> (Arc<CountingRuntime>, AgentGateway) {
        let runtime = Arc::new(CountingRuntime {
            pings: AtomicUsize::new(0),
        });
        let gateway = AgentGateway::new(Arc::clone(&runtime) as Arc<dyn AgentRuntime>, test_config());
        (runtime, gateway)
    }

    #[tokio::test]
    async fn initialize_pings_at_most_once() {
        let (runtime, gateway) = counting_gateway();

        gateway.initialize().await.unwrap();
        gateway.initialize().await.unwrap();
        gateway.initialize().await.unwrap();

        assert_eq!(runtime.pings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_threads_get_distinct_ids() {
        let (_, gateway) = counting_gateway();

        let a = gateway.new_thread().await;
        let b = gateway.new_thread().await;

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn threads_resolve_only_while_live() {
        let (_, gateway) = counting_gateway();

        let thread = gateway.new_thread().await;
        assert!(gateway.thread(&thread.id).await.is_some());
        assert!(gateway.thread("not-a-live-thread").await.is_none());

        gateway.release(&thread.id).await;
        assert!(gateway.thread(&thread.id).await.is_none());
    }

    #[tokio::test]
    async fn completed_stream_appends_to_history() {
        let (_, gateway) = counting_gateway();
        let thread = gateway.new_thread().await;

        let mut stream = gateway.run_streaming(&thread, "hello").await.unwrap();
        while let Some(fragment) = stream.next().await {
            fragment.unwrap();
        }
        drop(stream);

        assert_eq!(thread.history_len().await, 2);
    }

    #[tokio::test]
    async fn non_streaming_run_returns_text_and_records_history() {
        let (_, gateway) = counting_gateway();
        let thread = gateway.new_thread().await;

        let reply = gateway.run(&thread, "hello").await.unwrap();

        assert_eq!(reply, "ok");
        assert_eq!(thread.history_len().await, 2);
    }

    #[tokio::test]
    async fn abandoned_stream_leaves_history_untouched() {
        let (_, gateway) = counting_gateway();
        let thread = gateway.new_thread().await;

        let stream = gateway.run_streaming(&thread, "hello").await.unwrap();
        drop(stream);

        assert_eq!(thread.history_len().await, 0);
    }
}

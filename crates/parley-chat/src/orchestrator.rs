use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use parley_agent::{AgentGateway, AgentThread, GatewayRegistry};
use parley_cache::ThreadStateStore;
use parley_context::ContextWindowPolicy;
use parley_persist::{
    ChatMessage, Conversation, ConversationStore, MessageMetadata, MessageRole, ThreadBinding,
    TurnUpdate,
};

use crate::chunk::ResponseChunk;
use crate::error::ChatError;
use crate::limits::ChatLimits;
use crate::sanitize::sanitize;

/// Fixed user-facing content of the terminal chunk when the agent fails
pub const ASSISTANT_APOLOGY: &str =
    "I'm sorry, I ran into a problem while generating a response. Please try again.";

const DEFAULT_TITLE: &str = "New conversation";

/// Coordinates one conversation turn end to end
///
/// Resolves or creates the agent-thread binding for a conversation, drives
/// the streaming agent call, fans fragments out to the caller while
/// accumulating them, and persists the completed turn. Thread handles are
/// process-local: anything the cache remembers beyond the life of this
/// process yields a fresh thread, never a resumed one.
///
/// Cheap to clone; every field is shared behind an Arc or small config.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    store: Arc<dyn ConversationStore>,
    cache: Arc<dyn ThreadStateStore>,
    gateways: Arc<GatewayRegistry>,
    policy: ContextWindowPolicy,
    limits: ChatLimits,
}

impl ConversationOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        cache: Arc<dyn ThreadStateStore>,
        gateways: Arc<GatewayRegistry>,
        policy: ContextWindowPolicy,
        limits: ChatLimits,
    ) -> Self {
        Self {
            store,
            cache,
            gateways,
            policy,
            limits,
        }
    }

    /// Send a user message and stream the assistant response
    ///
    /// Returns immediately with a receiver; the send runs as its own task.
    /// Every outcome, success or failure, ends with exactly one terminal
    /// chunk (`is_complete = true`), so the caller never waits on a chunk
    /// that will not come.
    pub fn send_message_streaming(
        &self,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<ResponseChunk> {
        let (tx, rx) = mpsc::channel(64);
        let this = self.clone();
        let conversation_id = conversation_id.into();
        let user_id = user_id.into();
        let message = message.into();
        let assistant_message_id = uuid::Uuid::new_v4().to_string();

        tokio::spawn(async move {
            if let Err(err) = this
                .drive_send(
                    &conversation_id,
                    &user_id,
                    &message,
                    &assistant_message_id,
                    cancel,
                    &tx,
                )
                .await
            {
                let _ = tx
                    .send(ResponseChunk::error(&assistant_message_id, err.to_string()))
                    .await;
            }
        });

        rx
    }

    async fn drive_send(
        &self,
        conversation_id: &str,
        user_id: &str,
        message: &str,
        assistant_message_id: &str,
        cancel: CancellationToken,
        tx: &mpsc::Sender<ResponseChunk>,
    ) -> Result<(), ChatError> {
        // 1. Validate before anything has side effects
        if message.trim().is_empty() {
            return Err(ChatError::Validation("message must not be empty".to_string()));
        }
        if message.chars().count() > self.limits.max_message_len {
            return Err(ChatError::Validation(format!(
                "message exceeds the maximum length of {} characters",
                self.limits.max_message_len
            )));
        }

        // 2. Authorize; absence and foreign ownership read the same
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(ChatError::AccessDenied)?;

        // 3. Sanitize; an injection match is a signal, not a gate
        let sanitized = sanitize(message, self.limits.hard_ceiling);
        if let Some(phrase) = sanitized.injection {
            tracing::warn!(
                conversation_id = %conversation_id,
                user_id = %user_id,
                phrase = %phrase,
                "Prompt injection heuristic matched; processing anyway"
            );
        }

        // 4. The user turn must be durable before the agent is invoked
        let user_message = ChatMessage::new(
            conversation_id,
            user_id,
            MessageRole::User,
            &sanitized.content,
        );
        self.store.insert_message(user_message).await?;

        // 5. Bump conversation metadata; the first message names the conversation
        let set_title = (conversation.message_count == 0)
            .then(|| derive_title(&sanitized.content, self.limits.title_max_len));
        self.store
            .apply_turn(
                conversation_id,
                TurnUpdate {
                    set_title,
                    set_binding: None,
                },
            )
            .await?;

        // 6. Context pressure check (telemetry only for now)
        self.report_context_pressure(conversation_id).await;

        // 7. Resolve gateway and thread binding
        let gateway = self.resolve_gateway(&conversation).await;
        let (thread, new_binding) = self.resolve_thread(&gateway, &conversation).await;

        // 8. Stream; delivery never waits on persistence
        let started = Instant::now();
        let mut stream = match gateway.run_streaming(&thread, &sanitized.content).await {
            Ok(stream) => stream,
            Err(e) => {
                return self
                    .finish_agent_failure(
                        conversation_id,
                        user_id,
                        assistant_message_id,
                        e.to_string(),
                        tx,
                    )
                    .await;
            }
        };

        let mut accumulated = String::new();
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    // Dropping the stream aborts the in-flight agent call.
                    // A cancelled turn persists nothing.
                    drop(stream);
                    tracing::info!(conversation_id = %conversation_id, "Streaming send cancelled");
                    let _ = tx
                        .send(ResponseChunk::error(
                            assistant_message_id,
                            ChatError::Cancelled.to_string(),
                        ))
                        .await;
                    return Ok(());
                }

                fragment = stream.next() => match fragment {
                    Some(Ok(text)) => {
                        accumulated.push_str(&text);
                        let _ = tx
                            .send(ResponseChunk::fragment(assistant_message_id, text))
                            .await;
                    }
                    Some(Err(e)) => {
                        drop(stream);
                        return self
                            .finish_agent_failure(
                                conversation_id,
                                user_id,
                                assistant_message_id,
                                e.to_string(),
                                tx,
                            )
                            .await;
                    }
                    None => break,
                }
            }
        }

        // 9. Stream done: persist binding, assistant turn, metadata.
        // Each write is isolated; already-streamed content is never clawed back.
        if let Some(binding) = new_binding {
            self.persist_binding(conversation_id, binding).await;
        }

        let assistant_message = ChatMessage::new(
            conversation_id,
            user_id,
            MessageRole::Assistant,
            &accumulated,
        )
        .with_id(assistant_message_id);

        let metadata = MessageMetadata {
            token_count: Some(
                self.policy
                    .estimate_tokens(std::slice::from_ref(&assistant_message)),
            ),
            model: Some(gateway.model().to_string()),
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        };
        let assistant_message = assistant_message.with_metadata(metadata);

        let was_saved = match self.store.insert_message(assistant_message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Failed to persist assistant message"
                );
                false
            }
        };

        if was_saved {
            if let Err(e) = self
                .store
                .apply_turn(conversation_id, TurnUpdate::default())
                .await
            {
                tracing::error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Failed to update conversation metadata after assistant turn"
                );
            }
        }

        let _ = tx
            .send(ResponseChunk::complete(assistant_message_id, was_saved))
            .await;
        Ok(())
    }

    /// Load recent history and log when it overruns the token budget
    ///
    /// The trimmed view is computed for observability and future
    /// summarization; what reaches the agent is still the incremental message
    /// on the thread.
    async fn report_context_pressure(&self, conversation_id: &str) {
        let history = match self
            .store
            .list_recent_messages(conversation_id, self.limits.history_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "History load for context telemetry failed"
                );
                return;
            }
        };

        let estimated = self.policy.estimate_tokens(&history);
        if estimated > self.limits.token_budget {
            let trimmed = self.policy.trim(&history, self.limits.trim_target);
            tracing::info!(
                conversation_id = %conversation_id,
                estimated_tokens = estimated,
                token_budget = self.limits.token_budget,
                kept_messages = trimmed.len(),
                total_messages = history.len(),
                "Context window over budget; trimmed view computed"
            );
        }
    }

    /// Pick the gateway for a conversation's organization
    ///
    /// Organization lookup and override gateway construction both fail open
    /// to the shared default gateway.
    async fn resolve_gateway(&self, conversation: &Conversation) -> Arc<AgentGateway> {
        let Some(org_id) = conversation.organization_id.as_deref() else {
            return self.gateways.default_gateway();
        };

        let tuning = match self.store.get_organization(org_id).await {
            Ok(organization) => organization.and_then(|o| o.agent),
            Err(e) => {
                tracing::warn!(
                    organization_id = %org_id,
                    error = %e,
                    "Organization lookup failed; using default gateway"
                );
                None
            }
        };

        match self.gateways.resolve(Some(org_id), tuning.as_ref()).await {
            Ok(gateway) => gateway,
            Err(e) => {
                tracing::warn!(
                    organization_id = %org_id,
                    error = %e,
                    "Organization gateway unavailable; using default"
                );
                self.gateways.default_gateway()
            }
        }
    }

    /// Resolve a live thread for the conversation, creating one if needed
    ///
    /// Returns the thread plus the binding to persist when it was newly
    /// created. A cached identifier whose thread is no longer live (restart,
    /// another instance) gets a fresh thread; the prior agent-side context is
    /// gone and that is logged, not surfaced.
    ///
    /// Concurrent sends on one conversation can race here and each create a
    /// binding; the cache is last-writer-wins and the UI serializes sends per
    /// conversation, so this path deliberately takes no lock.
    async fn resolve_thread(
        &self,
        gateway: &Arc<AgentGateway>,
        conversation: &Conversation,
    ) -> (Arc<AgentThread>, Option<ThreadBinding>) {
        let existing = if self.cache.authoritative() {
            self.cache.get(&conversation.id).await
        } else {
            conversation
                .thread_binding
                .clone()
                .filter(|b| !b.is_expired(Utc::now()))
        };

        if let Some(binding) = existing {
            if let Some(thread) = gateway.thread(&binding.thread_id).await {
                tracing::debug!(
                    conversation_id = %conversation.id,
                    thread_id = %binding.thread_id,
                    "Reusing agent thread"
                );
                return (thread, None);
            }

            tracing::info!(
                conversation_id = %conversation.id,
                thread_id = %binding.thread_id,
                "Cached thread no longer live; starting a fresh one"
            );
        }

        let thread = gateway.new_thread().await;
        let binding = ThreadBinding::new(&conversation.id, &thread.id, self.limits.thread_ttl);
        (thread, Some(binding))
    }

    /// Persist a newly created binding to wherever the backend keeps it
    async fn persist_binding(&self, conversation_id: &str, binding: ThreadBinding) {
        if self.cache.authoritative() {
            self.cache.set(binding).await;
            return;
        }

        if let Err(e) = self.store.set_thread_binding(conversation_id, &binding).await {
            tracing::error!(
                conversation_id = %conversation_id,
                error = %e,
                "Failed to persist thread binding on conversation"
            );
        }
    }

    /// Resolve an agent failure into one terminal chunk
    ///
    /// The apology is persisted best-effort so the conversation record stays
    /// coherent; a failure of that write is swallowed since the caller
    /// already has the error.
    async fn finish_agent_failure(
        &self,
        conversation_id: &str,
        user_id: &str,
        assistant_message_id: &str,
        reason: String,
        tx: &mpsc::Sender<ResponseChunk>,
    ) -> Result<(), ChatError> {
        tracing::error!(
            conversation_id = %conversation_id,
            error = %reason,
            "Agent call failed"
        );

        let apology = ChatMessage::new(
            conversation_id,
            user_id,
            MessageRole::Assistant,
            ASSISTANT_APOLOGY,
        )
        .with_id(assistant_message_id)
        .with_metadata(MessageMetadata {
            error: Some(reason.clone()),
            ..Default::default()
        });

        let was_saved = match self.store.insert_message(apology).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Failed to persist error message"
                );
                false
            }
        };

        let _ = tx
            .send(ResponseChunk {
                content: ASSISTANT_APOLOGY.to_string(),
                message_id: assistant_message_id.to_string(),
                is_complete: true,
                error: Some(reason),
                was_saved: Some(was_saved),
            })
            .await;

        Ok(())
    }

    // --- CRUD wrappers, same ownership discipline as the send pipeline ---

    pub async fn create_conversation(
        &self,
        user_id: &str,
        organization_id: Option<String>,
        title: Option<String>,
    ) -> Result<Conversation, ChatError> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| derive_title(&t, self.limits.title_max_len))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let conversation = Conversation::new(user_id, organization_id, title);
        Ok(self.store.create_conversation(conversation).await?)
    }

    pub async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Conversation, ChatError> {
        self.store
            .get_conversation(conversation_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(ChatError::AccessDenied)
    }

    pub async fn list_conversations(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Conversation>, ChatError> {
        Ok(self.store.list_conversations(user_id, limit).await?)
    }

    /// Soft-delete a conversation and invalidate its thread binding
    pub async fn delete_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<(), ChatError> {
        let conversation = self.get_conversation(conversation_id, user_id).await?;

        self.store.soft_delete_conversation(conversation_id).await?;

        let binding = if self.cache.authoritative() {
            self.cache.get(conversation_id).await
        } else {
            conversation.thread_binding.clone()
        };
        if let Some(binding) = binding {
            let gateway = self.resolve_gateway(&conversation).await;
            gateway.release(&binding.thread_id).await;
        }
        self.cache.remove(conversation_id).await;
        if let Err(e) = self.store.clear_thread_binding(conversation_id).await {
            tracing::warn!(
                conversation_id = %conversation_id,
                error = %e,
                "Failed to clear embedded thread binding"
            );
        }

        Ok(())
    }

    pub async fn update_title(
        &self,
        conversation_id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<String, ChatError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ChatError::Validation("title must not be empty".to_string()));
        }

        self.get_conversation(conversation_id, user_id).await?;

        let title = derive_title(trimmed, self.limits.title_max_len);
        self.store.update_title(conversation_id, &title).await?;
        Ok(title)
    }

    pub async fn list_messages(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.get_conversation(conversation_id, user_id).await?;
        Ok(self
            .store
            .list_recent_messages(conversation_id, limit)
            .await?)
    }

    pub async fn count_messages(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<u64, ChatError> {
        self.get_conversation(conversation_id, user_id).await?;
        Ok(self.store.count_messages(conversation_id).await?)
    }
}

/// Cut content down to a conversation title
fn derive_title(content: &str, max_len: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }

    let cut: String = trimmed.chars().take(max_len).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_becomes_the_title_verbatim() {
        assert_eq!(derive_title("  Hello there  ", 50), "Hello there");
    }

    #[test]
    fn long_content_is_truncated_with_ellipsis() {
        let content = "a".repeat(80);
        let title = derive_title(&content, 50);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let content = "é".repeat(80);
        let title = derive_title(&content, 50);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 53);
    }
}

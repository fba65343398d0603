use parley_persist::{ChatMessage, MessageRole};

/// Approximate characters per language-model token
pub const CHARS_PER_TOKEN: usize = 4;

/// Tokens held back for the system prompt when trimming
pub const DEFAULT_RESERVED_TOKENS: usize = 200;

/// History budget above which trimming kicks in
pub const DEFAULT_TOKEN_BUDGET: usize = 6000;

/// Budget a trimmed history is cut down to
pub const DEFAULT_TRIM_TARGET: usize = 4000;

// Fixed per-message formatting overhead, in characters, before division.
// Non-user turns carry role/name framing the user turn does not.
const USER_OVERHEAD_CHARS: usize = 8;
const OTHER_OVERHEAD_CHARS: usize = 12;

/// Deterministic context-window policy
///
/// Token estimation is a pure approximation over character counts; no
/// tokenizer, no I/O. Good enough to decide when history needs trimming and
/// trivially testable.
#[derive(Debug, Clone)]
pub struct ContextWindowPolicy {
    reserved_tokens: usize,
}

impl ContextWindowPolicy {
    pub fn new(reserved_tokens: usize) -> Self {
        Self { reserved_tokens }
    }

    pub fn reserved_tokens(&self) -> usize {
        self.reserved_tokens
    }

    fn message_cost(message: &ChatMessage) -> usize {
        let overhead = match message.role {
            MessageRole::User => USER_OVERHEAD_CHARS,
            MessageRole::Assistant | MessageRole::System => OTHER_OVERHEAD_CHARS,
        };
        let chars = message.content.chars().count() + overhead;
        chars.div_ceil(CHARS_PER_TOKEN)
    }

    /// Estimated token count of a message history
    pub fn estimate_tokens(&self, messages: &[ChatMessage]) -> usize {
        messages.iter().map(Self::message_cost).sum()
    }

    /// Keep the newest messages that fit the budget
    ///
    /// Greedy newest-first accumulation against `max_tokens` minus the
    /// reserved system-prompt buffer; stops at the first message that would
    /// overflow. Messages are kept or dropped whole, never truncated. The
    /// kept subset is returned in chronological order.
    pub fn trim(&self, messages: &[ChatMessage], max_tokens: usize) -> Vec<ChatMessage> {
        let budget = max_tokens.saturating_sub(self.reserved_tokens);

        let mut kept: Vec<ChatMessage> = Vec::new();
        let mut used = 0;

        for message in messages.iter().rev() {
            let cost = Self::message_cost(message);
            if used + cost > budget {
                break;
            }
            used += cost;
            kept.push(message.clone());
        }

        kept.reverse();
        kept
    }

    /// Whether the history overruns the budget
    pub fn exceeds_limit(&self, messages: &[ChatMessage], max_tokens: usize) -> bool {
        self.estimate_tokens(messages) > max_tokens
    }
}

impl Default for ContextWindowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn message(role: MessageRole, content: &str, age_minutes: i64) -> ChatMessage {
        let mut m = ChatMessage::new("c1", "u1", role, content);
        m.created_at = Utc::now() - Duration::minutes(age_minutes);
        m
    }

    fn history(sizes: &[usize]) -> Vec<ChatMessage> {
        // Oldest first, alternating roles, content of the requested char counts
        sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                message(role, &"x".repeat(n), (sizes.len() - i) as i64)
            })
            .collect()
    }

    #[test]
    fn empty_history_estimates_to_zero() {
        let policy = ContextWindowPolicy::default();
        assert_eq!(policy.estimate_tokens(&[]), 0);
    }

    #[test]
    fn estimation_is_deterministic() {
        let policy = ContextWindowPolicy::default();
        let messages = history(&[100, 250, 37]);

        assert_eq!(
            policy.estimate_tokens(&messages),
            policy.estimate_tokens(&messages)
        );
    }

    #[test]
    fn estimation_rounds_up_and_charges_role_overhead() {
        let policy = ContextWindowPolicy::default();

        // 1 char + 8 overhead = 9 chars -> ceil(9 / 4) = 3 tokens
        let user = vec![message(MessageRole::User, "x", 0)];
        assert_eq!(policy.estimate_tokens(&user), 3);

        // 1 char + 12 overhead = 13 chars -> ceil(13 / 4) = 4 tokens
        let assistant = vec![message(MessageRole::Assistant, "x", 0)];
        assert_eq!(policy.estimate_tokens(&assistant), 4);
    }

    #[test]
    fn trim_keeps_within_budget_minus_reserve() {
        let policy = ContextWindowPolicy::default();
        let messages = history(&[2000, 2000, 2000, 2000, 2000]);
        let max_tokens = 1500;

        let kept = policy.trim(&messages, max_tokens);

        assert!(policy.estimate_tokens(&kept) <= max_tokens - DEFAULT_RESERVED_TOKENS);
        assert!(!kept.is_empty());
    }

    #[test]
    fn trim_prefers_newest_messages() {
        let policy = ContextWindowPolicy::default();
        // Equal-size messages: whatever is kept must be the newest suffix
        let messages = history(&[400, 400, 400, 400, 400, 400]);

        let kept = policy.trim(&messages, 500);

        assert!(!kept.is_empty());
        assert!(kept.len() < messages.len());
        let suffix = &messages[messages.len() - kept.len()..];
        for (kept_msg, original) in kept.iter().zip(suffix) {
            assert_eq!(kept_msg.id, original.id);
        }
    }

    #[test]
    fn trim_returns_chronological_order() {
        let policy = ContextWindowPolicy::default();
        let messages = history(&[50, 50, 50, 50]);

        let kept = policy.trim(&messages, 6000);

        assert_eq!(kept.len(), messages.len());
        for pair in kept.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn overflowing_message_is_dropped_whole() {
        let policy = ContextWindowPolicy::default();
        // Newest message alone blows the budget: nothing may be partially kept
        let messages = history(&[100, 100_000]);

        let kept = policy.trim(&messages, 500);

        assert!(kept.is_empty());
    }

    #[test]
    fn exceeds_limit_matches_estimation() {
        let policy = ContextWindowPolicy::default();
        let messages = history(&[4000, 4000, 4000, 4000, 4000, 4000, 4000]);

        assert!(policy.exceeds_limit(&messages, DEFAULT_TOKEN_BUDGET));
        assert!(!policy.exceeds_limit(&messages, 1_000_000));
        assert!(!policy.exceeds_limit(&[], 0));
    }
}

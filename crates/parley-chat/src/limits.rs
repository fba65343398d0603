use chrono::Duration;

use parley_context::{DEFAULT_TOKEN_BUDGET, DEFAULT_TRIM_TARGET};
use parley_persist::DEFAULT_THREAD_TTL_HOURS;

/// Operational resource limits for the send pipeline
#[derive(Debug, Clone)]
pub struct ChatLimits {
    /// Longest message a user may submit
    pub max_message_len: usize,
    /// Defense-in-depth truncation ceiling applied during sanitization
    pub hard_ceiling: usize,
    /// History size above which trimming telemetry fires
    pub token_budget: usize,
    /// Budget the trimmed view is computed against
    pub trim_target: usize,
    /// Auto-derived conversation titles are cut here
    pub title_max_len: usize,
    /// How many recent messages are loaded for context inspection
    pub history_limit: i64,
    /// Lifetime of a thread binding
    pub thread_ttl: Duration,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self {
            max_message_len: 10_000,
            hard_ceiling: 32_000,
            token_budget: DEFAULT_TOKEN_BUDGET,
            trim_target: DEFAULT_TRIM_TARGET,
            title_max_len: 50,
            history_limit: 100,
            thread_ttl: Duration::hours(DEFAULT_THREAD_TTL_HOURS),
        }
    }
}

use serde::{Deserialize, Serialize};

/// One increment of streamed assistant output
///
/// Transient: produced by the orchestrator, consumed by the caller, never
/// stored. Exactly one chunk per stream carries `is_complete = true` and it is
/// always the last one; `error` and `was_saved` only appear on that terminal
/// chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseChunk {
    pub content: String,
    pub message_id: String,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_saved: Option<bool>,
}

impl ResponseChunk {
    /// An intermediate content fragment
    pub fn fragment(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_id: message_id.into(),
            is_complete: false,
            error: None,
            was_saved: None,
        }
    }

    /// Successful terminal chunk
    pub fn complete(message_id: impl Into<String>, was_saved: bool) -> Self {
        Self {
            content: String::new(),
            message_id: message_id.into(),
            is_complete: true,
            error: None,
            was_saved: Some(was_saved),
        }
    }

    /// Terminal chunk for a failed send
    pub fn error(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            message_id: message_id.into(),
            is_complete: true,
            error: Some(error.into()),
            was_saved: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_not_terminal() {
        let chunk = ResponseChunk::fragment("m1", "Hello");
        assert!(!chunk.is_complete);
        assert!(chunk.error.is_none());
        assert!(chunk.was_saved.is_none());
    }

    #[test]
    fn terminal_flags_are_omitted_from_fragments() {
        let json = serde_json::to_string(&ResponseChunk::fragment("m1", "Hi")).unwrap();
        assert!(!json.contains("error"));
        assert!(!json.contains("was_saved"));

        let json = serde_json::to_string(&ResponseChunk::complete("m1", true)).unwrap();
        assert!(json.contains("\"was_saved\":true"));
    }
}

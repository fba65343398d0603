use std::collections::VecDeque;
use std::pin::Pin;

use anyhow::Result;
use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::{Deserialize, Serialize};

/// Lazy sequence of incremental assistant text fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

impl StreamChunk {
    fn content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.delta.content.as_deref())
    }

    fn is_done(&self) -> bool {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_ref())
            .is_some()
    }
}

/// Parse an SSE completion response into a fragment stream
///
/// Lines arrive as `data: {json}` frames terminated by a `data: [DONE]`
/// sentinel. Partial lines are buffered across network chunks.
pub fn parse_fragment_stream(response: Response) -> FragmentStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = VecDeque::with_capacity(8192);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes);

                    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                        if let Ok(line_str) = std::str::from_utf8(&line_bytes) {
                            let line = line_str.trim();

                            if line.is_empty() {
                                continue;
                            }

                            if let Some(data) = line.strip_prefix("data: ") {
                                if data == "[DONE]" {
                                    return;
                                }

                                match serde_json::from_str::<StreamChunk>(data) {
                                    Ok(chunk) => {
                                        if chunk.is_done() {
                                            return;
                                        }
                                        if let Some(content) = chunk.content() {
                                            if !content.is_empty() {
                                                yield Ok(content.to_string());
                                            }
                                        }
                                    }
                                    Err(e) => yield Err(anyhow::anyhow!("Failed to parse stream chunk: {}", e)),
                                }
                            }
                        }
                    }
                }
                Err(e) => yield Err(anyhow::anyhow!("Stream error: {}", e)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_content_reads_first_choice() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"role":"assistant","content":"Hi"},"finish_reason":null}]}"#,
        )
        .unwrap();

        assert_eq!(chunk.content(), Some("Hi"));
        assert!(!chunk.is_done());
    }

    #[test]
    fn chunk_with_finish_reason_is_done() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"role":null,"content":null},"finish_reason":"stop"}]}"#,
        )
        .unwrap();

        assert!(chunk.is_done());
    }
}

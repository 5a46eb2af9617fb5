use serde_json::Value;

use crate::events::{ChatFinishReason, ChatStreamEvent};

/// Incremental parser for SSE text streams.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            if let Some(payload) = extract_data_payload(&frame) {
                if payload == "[DONE]" || payload.is_empty() {
                    continue;
                }

                if let Ok(value) = serde_json::from_str::<Value>(&payload) {
                    events.extend(map_chunk_events(value));
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<ChatStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

/// A single `chat.completion.chunk` frame can carry both a delta and a
/// terminal `finish_reason`, so one frame may map to multiple events.
fn map_chunk_events(value: Value) -> Vec<ChatStreamEvent> {
    if let Some(error) = value.get("error") {
        let code = error
            .get("code")
            .and_then(|value| value.as_str())
            .map(ToString::to_string);
        let message = error
            .get("message")
            .and_then(|value| value.as_str())
            .map(ToString::to_string);
        return vec![ChatStreamEvent::Error { code, message }];
    }

    let Some(choice) = value
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
    else {
        return Vec::new();
    };

    let mut events = Vec::new();

    if let Some(delta) = choice.get("delta") {
        if let Some(role) = delta.get("role").and_then(|value| value.as_str()) {
            events.push(ChatStreamEvent::RoleDelta {
                role: role.to_owned(),
            });
        }

        if let Some(content) = delta.get("content").and_then(|value| value.as_str()) {
            if !content.is_empty() {
                events.push(ChatStreamEvent::ContentDelta {
                    delta: content.to_owned(),
                });
            }
        }
    }

    if let Some(finish_reason) = choice.get("finish_reason").and_then(|value| value.as_str()) {
        events.push(ChatStreamEvent::Completed {
            finish_reason: ChatFinishReason::parse(finish_reason),
        });
    }

    events
}

use serde::{Deserialize, Serialize};

/// Canonical terminal state mapped from `finish_reason` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatFinishReason {
    Stop,
    Length,
    ContentFilter,
}

impl ChatFinishReason {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
        }
    }
}

/// Stream event emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// Assistant role announcement at the head of a stream.
    RoleDelta { role: String },
    ContentDelta { delta: String },
    Completed { finish_reason: Option<ChatFinishReason> },
    Error {
        code: Option<String>,
        message: Option<String>,
    },
}

/// Accumulates streamed fragments into the final assistant message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatEventAccumulator {
    pub content: String,
    pub finish_reason: Option<ChatFinishReason>,
    pub completed: bool,
}

impl ChatEventAccumulator {
    pub fn apply(&mut self, event: &ChatStreamEvent) {
        match event {
            ChatStreamEvent::ContentDelta { delta } => self.content.push_str(delta),
            ChatStreamEvent::Completed { finish_reason } => {
                self.finish_reason = *finish_reason;
                self.completed = true;
            }
            ChatStreamEvent::RoleDelta { .. } | ChatStreamEvent::Error { .. } => {}
        }
    }

    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a ChatStreamEvent>) {
        for event in events {
            self.apply(event);
        }
    }
}

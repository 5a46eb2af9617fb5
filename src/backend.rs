use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chat_api::{
    ChatApiClient, ChatApiConfig, ChatApiError, ChatEventAccumulator, ChatMessage as ApiMessage,
    ChatRequest, ChatStreamEvent,
};
use chat_session::{ChatMessage, ChatRole};

/// Cancellation flag shared between the surface and an in-flight turn.
pub type CancelSignal = Arc<AtomicBool>;

/// Seam between the app flow and whatever produces assistant replies.
///
/// Implementations stream fragments through `on_delta` and return the
/// accumulated assistant text once the stream completes. The API key is
/// passed per call because it is runtime input, never stored config.
pub trait ChatBackend: Send + Sync {
    fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        cancel: &CancelSignal,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, String>;
}

/// `ChatBackend` backed by `chat_api` transport primitives.
pub struct ApiChatBackend {
    model: String,
    base_url: Option<String>,
}

impl ApiChatBackend {
    #[must_use]
    pub fn new(model: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            base_url,
        }
    }

    fn config_for(&self, api_key: &str) -> ChatApiConfig {
        let config = ChatApiConfig::new(api_key);
        match &self.base_url {
            Some(base_url) => config.with_base_url(base_url.clone()),
            None => config,
        }
    }

    fn request_for(&self, messages: &[ChatMessage]) -> ChatRequest {
        ChatRequest::new(self.model.clone(), messages.iter().map(api_message).collect())
    }
}

fn api_message(message: &ChatMessage) -> ApiMessage {
    match message.role {
        ChatRole::User => ApiMessage::user(message.content.clone()),
        ChatRole::Assistant => ApiMessage::assistant(message.content.clone()),
    }
}

impl ChatBackend for ApiChatBackend {
    fn complete(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        cancel: &CancelSignal,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, String> {
        let client = ChatApiClient::new(self.config_for(api_key))
            .map_err(|error| format!("failed to initialize chat client: {error}"))?;
        let request = self.request_for(messages);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| format!("failed to initialize tokio runtime: {error}"))?;

        let mut accumulator = ChatEventAccumulator::default();
        let outcome = runtime.block_on(client.stream_with_handler(
            &request,
            Some(cancel),
            |event| {
                if let ChatStreamEvent::ContentDelta { delta } = &event {
                    on_delta(delta);
                }
                accumulator.apply(&event);
            },
        ));

        match outcome {
            Ok(_terminal) => Ok(accumulator.content),
            Err(ChatApiError::Cancelled) => Err("chat request was cancelled".to_string()),
            Err(error) => Err(format!("chat request failed: {error}")),
        }
    }
}

/// Deterministic backend for tests and offline demos: replays fixed
/// chunks through the same streaming contract as the real transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockChatBackend {
    chunks: Vec<String>,
}

impl MockChatBackend {
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self {
            chunks: vec!["Mocked ".to_string(), "assistant ".to_string(), "reply.".to_string()],
        }
    }
}

impl ChatBackend for MockChatBackend {
    fn complete(
        &self,
        _api_key: &str,
        _messages: &[ChatMessage],
        cancel: &CancelSignal,
        on_delta: &mut dyn FnMut(&str),
    ) -> Result<String, String> {
        let mut content = String::new();
        for chunk in &self.chunks {
            if cancel.load(Ordering::Acquire) {
                return Err("chat request was cancelled".to_string());
            }
            on_delta(chunk);
            content.push_str(chunk);
        }

        Ok(content)
    }
}

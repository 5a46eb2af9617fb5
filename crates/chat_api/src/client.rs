use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, ChatApiError};
use crate::events::{ChatFinishReason, ChatStreamEvent};
use crate::headers::build_headers;
use crate::payload::ChatRequest;
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::sse::SseStreamParser;
use crate::url::normalize_chat_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<ChatStreamEvent>,
    pub terminal: Option<ChatFinishReason>,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    ChatApiError::InvalidBaseUrl(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    ChatApiError::InvalidBaseUrl(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        validate_request_payload_shape(request)?;

        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        let payload = self.request_with_transport_defaults(request);
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&payload))
    }

    fn request_with_transport_defaults(&self, request: &ChatRequest) -> ChatRequest {
        let mut payload = request.clone();
        payload.stream = true;
        payload
    }

    pub async fn send_with_retry(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, ChatApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }

            let response = self.build_request(request)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(ChatApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_else(|_| {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());
                    let should_retry = is_retryable_http_error(status.as_u16(), &body)
                        && !has_quota_message(&message);

                    if attempt < MAX_RETRIES && should_retry {
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(ChatApiError::Status(status, message));
                }
                Err(error) => {
                    let message = error.to_string();
                    last_error = Some(message.clone());
                    if attempt < MAX_RETRIES {
                        await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                    return Err(ChatApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(ChatApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    pub async fn stream_with_handler<F>(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<Option<ChatFinishReason>, ChatApiError>
    where
        F: FnMut(ChatStreamEvent),
    {
        let response = self.send_with_retry(request, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut terminal = None;

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            let chunk = chunk.map_err(ChatApiError::from)?;
            for event in parser.feed(&chunk) {
                process_stream_event(event, &mut terminal, &mut on_event)?;
            }
        }

        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        Ok(terminal.flatten())
    }

    pub async fn stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, ChatApiError> {
        let mut events = Vec::new();
        let terminal = self
            .stream_with_handler(request, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult { events, terminal })
    }
}

fn validate_request_payload_shape(request: &ChatRequest) -> Result<(), ChatApiError> {
    if request.messages.is_empty() {
        return Err(ChatApiError::InvalidRequestPayload(
            "'messages' must contain at least one message".to_string(),
        ));
    }
    if request.model.trim().is_empty() {
        return Err(ChatApiError::InvalidRequestPayload(
            "'model' must be a non-empty model id".to_string(),
        ));
    }

    Ok(())
}

fn process_stream_event<F>(
    event: ChatStreamEvent,
    terminal: &mut Option<Option<ChatFinishReason>>,
    on_event: &mut F,
) -> Result<(), ChatApiError>
where
    F: FnMut(ChatStreamEvent),
{
    if let ChatStreamEvent::Error { code, message } = &event {
        return Err(ChatApiError::StreamFailed {
            code: code.clone(),
            message: message
                .clone()
                .or_else(|| code.clone())
                .unwrap_or_else(|| "chat stream reported an error".to_owned()),
        });
    }

    if let ChatStreamEvent::Completed { finish_reason } = &event {
        *terminal = Some(*finish_reason);
    }

    on_event(event);
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

fn has_quota_message(message: &str) -> bool {
    message.contains("quota or rate limit")
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{process_stream_event, validate_request_payload_shape};
    use crate::error::ChatApiError;
    use crate::events::{ChatFinishReason, ChatStreamEvent};
    use crate::payload::{ChatMessage, ChatRequest};
    use crate::sse::SseStreamParser;

    #[test]
    fn empty_message_list_fails_preflight() {
        let request = ChatRequest::new("gpt-3.5-turbo", Vec::new());
        assert!(matches!(
            validate_request_payload_shape(&request),
            Err(ChatApiError::InvalidRequestPayload(_))
        ));
    }

    #[test]
    fn blank_model_fails_preflight() {
        let request = ChatRequest::new("  ", vec![ChatMessage::user("hi")]);
        assert!(matches!(
            validate_request_payload_shape(&request),
            Err(ChatApiError::InvalidRequestPayload(_))
        ));
    }

    #[test]
    fn process_stream_event_emits_deltas_in_parser_order() {
        let frames = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"A\"},\"finish_reason\":null}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"B\"},\"finish_reason\":null}]}\n\n",
        );
        let mut parser = SseStreamParser::default();
        let parsed = parser.feed(frames.as_bytes());

        let mut terminal = None;
        let mut observed = Vec::new();
        for event in parsed {
            process_stream_event(event, &mut terminal, &mut |event| observed.push(event))
                .expect("content deltas should process successfully");
        }

        assert!(terminal.is_none());
        assert_eq!(
            observed,
            vec![
                ChatStreamEvent::ContentDelta {
                    delta: "A".to_string(),
                },
                ChatStreamEvent::ContentDelta {
                    delta: "B".to_string(),
                },
            ]
        );
    }

    #[test]
    fn process_stream_event_tracks_terminal_finish_reason() {
        let mut terminal = None;
        let mut observed = Vec::new();

        process_stream_event(
            ChatStreamEvent::Completed {
                finish_reason: Some(ChatFinishReason::Stop),
            },
            &mut terminal,
            &mut |event| observed.push(event),
        )
        .expect("completed event should process successfully");

        assert_eq!(terminal.flatten(), Some(ChatFinishReason::Stop));
        assert_eq!(observed.len(), 1);
    }

    #[test]
    fn process_stream_event_converts_error_frames_to_stream_failure() {
        let mut terminal = None;
        let result = process_stream_event(
            ChatStreamEvent::Error {
                code: Some("server_error".to_owned()),
                message: Some("boom".to_owned()),
            },
            &mut terminal,
            &mut |_| {},
        );

        assert!(matches!(
            result,
            Err(ChatApiError::StreamFailed { message, .. }) if message == "boom"
        ));
    }
}

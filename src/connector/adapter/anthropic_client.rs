use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::ProviderAdapter;
use crate::domain::{ConversationTurn, DomainError, Role};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage<'a>>,
    stream: bool,
}

#[derive(serde::Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// The subset of streaming events that carry text or signal failure.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    MessageStop,
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// What one server-sent event means for the relay.
#[derive(Debug, PartialEq)]
enum Decoded {
    Text(String),
    Stop,
    Skip,
}

fn decode_event(data: &str) -> Result<Decoded, DomainError> {
    match serde_json::from_str::<StreamEvent>(data) {
        Ok(StreamEvent::ContentBlockDelta { delta }) => Ok(delta
            .text
            .filter(|text| !text.is_empty())
            .map_or(Decoded::Skip, Decoded::Text)),
        Ok(StreamEvent::MessageStop) => Ok(Decoded::Stop),
        Ok(StreamEvent::Error { error }) => Err(DomainError::provider(format!(
            "AnthropicClient: {}",
            error.message
        ))),
        Ok(StreamEvent::Other) => Ok(Decoded::Skip),
        Err(e) => {
            debug!("AnthropicClient: skipping unparseable event: {e}");
            Ok(Decoded::Skip)
        }
    }
}

/// Relay text deltas from a raw event-stream body until `message_stop`.
///
/// A body that ends without `message_stop` was cut off and is an error.
async fn forward_events<S, B, E>(body: S, chunks: &mpsc::Sender<String>) -> Result<(), DomainError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut events = pin!(body.eventsource());

    while let Some(event) = events.next().await {
        let event = event.map_err(|e| {
            DomainError::provider(format!("AnthropicClient: stream interrupted: {e}"))
        })?;

        match decode_event(&event.data)? {
            Decoded::Text(text) => chunks
                .send(text)
                .await
                .map_err(|_| DomainError::internal("stream receiver dropped"))?,
            Decoded::Stop => return Ok(()),
            Decoded::Skip => {}
        }
    }

    Err(DomainError::provider(
        "AnthropicClient: stream ended before message_stop",
    ))
}

/// Provider adapter for the Anthropic Messages API (and compatible servers).
///
/// System turns are folded into the top-level `system` field; the remaining
/// turns are sent in order as `user`/`assistant` messages.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    /// Full endpoint URL (base + MESSAGES_PATH).
    url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), MESSAGES_PATH);
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request<'a>(
        history: &'a [ConversationTurn],
        model_id: &'a str,
        stream: bool,
    ) -> ApiRequest<'a> {
        let system: Vec<&str> = history
            .iter()
            .filter(|turn| turn.role() == Role::System)
            .map(ConversationTurn::content)
            .collect();

        let messages = history
            .iter()
            .filter(|turn| turn.role() != Role::System)
            .map(|turn| ApiMessage {
                role: turn.role().as_str(),
                content: turn.content(),
            })
            .collect();

        ApiRequest {
            model: model_id,
            max_tokens: MAX_TOKENS,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages,
            stream,
        }
    }

    async fn send(&self, request: &ApiRequest<'_>) -> Result<reqwest::Response, DomainError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::provider(format!("AnthropicClient: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("AnthropicClient: API returned {status}: {body}");
            return Err(DomainError::provider(format!(
                "AnthropicClient: API returned {status}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
    ) -> Result<String, DomainError> {
        let request = Self::build_request(history, model_id, false);
        let response = self.send(&request).await?;

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            DomainError::provider(format!("AnthropicClient: failed to parse response: {e}"))
        })?;

        Ok(api_response
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .concat())
    }

    async fn generate_stream(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
        chunks: mpsc::Sender<String>,
    ) -> Result<(), DomainError> {
        let request = Self::build_request(history, model_id, true);
        let response = self.send(&request).await?;

        forward_events(response.bytes_stream(), &chunks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_turns_become_top_level_system() {
        let history = vec![
            ConversationTurn::system("be brief"),
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
            ConversationTurn::user("again"),
        ];

        let request = AnthropicClient::build_request(&history, "claude-sonnet", false);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["system"], "be brief");
        assert_eq!(json["messages"].as_array().unwrap().len(), 3);
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn system_is_omitted_when_absent() {
        let history = vec![ConversationTurn::user("hi")];
        let json = serde_json::to_value(AnthropicClient::build_request(&history, "m", true)).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = AnthropicClient::new("key", "http://localhost:1234/");
        assert_eq!(client.url(), "http://localhost:1234/v1/messages");
    }

    #[test]
    fn stream_events_parse() {
        let delta: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        )
        .unwrap();
        assert!(matches!(delta, StreamEvent::ContentBlockDelta { delta } if delta.text.as_deref() == Some("Hi")));

        let ping: StreamEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ping, StreamEvent::Other));
    }

    fn body(frames: &[&str]) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> {
        let frames: Vec<_> = frames.iter().map(|f| Ok(f.as_bytes().to_vec())).collect();
        futures_util::stream::iter(frames)
    }

    async fn relay(frames: &[&str]) -> (Result<(), DomainError>, Vec<String>) {
        let (tx, mut rx) = mpsc::channel(16);
        let result = forward_events(body(frames), &tx).await;
        drop(tx);
        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.push(chunk);
        }
        (result, received)
    }

    const HELLO: &str = "event: content_block_delta\n\
        data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n";
    const STOP: &str = "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n";

    #[tokio::test]
    async fn relays_deltas_until_message_stop() {
        let (result, chunks) = relay(&[
            "event: message_start\ndata: {\"type\":\"message_start\"}\n\n",
            HELLO,
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"delta\":{\"text\":\" wor",
            "ld\"}}\n\n",
            STOP,
        ])
        .await;

        assert!(result.is_ok());
        assert_eq!(chunks, vec!["Hello", " world"]);
    }

    #[tokio::test]
    async fn body_ending_before_message_stop_is_an_error() {
        let (result, chunks) = relay(&[HELLO]).await;

        let err = result.unwrap_err();
        assert!(err.is_provider_error());
        assert!(err.to_string().contains("message_stop"));
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[tokio::test]
    async fn error_event_fails_the_stream() {
        let (result, _) = relay(&[
            HELLO,
            "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
            STOP,
        ])
        .await;

        assert!(result.unwrap_err().to_string().contains("Overloaded"));
    }

    #[test]
    fn empty_delta_is_skipped() {
        let decoded = decode_event(r#"{"type":"content_block_delta","delta":{"text":""}}"#).unwrap();
        assert_eq!(decoded, Decoded::Skip);
    }
}

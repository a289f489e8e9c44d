use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::ProviderAdapter;
use crate::domain::{ConversationTurn, DomainError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const COMPLETIONS_PATH: &str = "/chat/completions";
const DONE_MARKER: &str = "[DONE]";

#[derive(serde::Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
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
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

/// What one server-sent event means for the relay.
#[derive(Debug, PartialEq)]
enum Decoded {
    Deltas { texts: Vec<String>, finished: bool },
    Done,
    Skip,
}

fn decode_event(name: &str, data: &str) -> Result<Decoded, DomainError> {
    if data.trim() == DONE_MARKER {
        return Ok(Decoded::Done);
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!("{name}: skipping unparseable chunk: {e}");
            return Ok(Decoded::Skip);
        }
    };

    if let Some(error) = chunk.error {
        return Err(DomainError::provider(format!("{name}: {}", error.message)));
    }

    let finished = chunk.choices.iter().any(|choice| choice.finish_reason.is_some());
    let texts = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .filter(|text| !text.is_empty())
        .collect();

    Ok(Decoded::Deltas { texts, finished })
}

/// Relay content deltas from a raw event-stream body until `[DONE]`.
///
/// Some compatible servers omit `[DONE]`; a body that closes after a
/// `finish_reason` still counts as complete. Anything else was cut off.
async fn forward_events<S, B, E>(
    name: &str,
    body: S,
    chunks: &mpsc::Sender<String>,
) -> Result<(), DomainError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut events = pin!(body.eventsource());
    let mut finished = false;

    while let Some(event) = events.next().await {
        let event = event
            .map_err(|e| DomainError::provider(format!("{name}: stream interrupted: {e}")))?;

        match decode_event(name, &event.data)? {
            Decoded::Deltas { texts, finished: done } => {
                for text in texts {
                    chunks
                        .send(text)
                        .await
                        .map_err(|_| DomainError::internal("stream receiver dropped"))?;
                }
                finished |= done;
            }
            Decoded::Done => return Ok(()),
            Decoded::Skip => {}
        }
    }

    if finished {
        Ok(())
    } else {
        Err(DomainError::provider(format!(
            "{name}: stream ended before [DONE]"
        )))
    }
}

/// Provider adapter for OpenAI-style Chat Completions endpoints.
///
/// The same wire format is served by OpenAI, xAI, Perplexity, DeepSeek and
/// Gemini's compatibility layer, so one client type covers all of them; `name`
/// tells them apart in logs.
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    name: String,
    api_key: String,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiCompatibleClient {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), COMPLETIONS_PATH);
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            name: name.into(),
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
        ApiRequest {
            model: model_id,
            messages: history
                .iter()
                .map(|turn| ApiMessage {
                    role: turn.role().as_str(),
                    content: turn.content(),
                })
                .collect(),
            stream,
        }
    }

    async fn send(&self, request: &ApiRequest<'_>) -> Result<reqwest::Response, DomainError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| DomainError::provider(format!("{}: request failed: {e}", self.name)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("{}: API returned {status}: {body}", self.name);
            return Err(DomainError::provider(format!(
                "{}: API returned {status}",
                self.name
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
    ) -> Result<String, DomainError> {
        let request = Self::build_request(history, model_id, false);
        let response = self.send(&request).await?;

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            DomainError::provider(format!("{}: failed to parse response: {e}", self.name))
        })?;

        Ok(api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn generate_stream(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
        chunks: mpsc::Sender<String>,
    ) -> Result<(), DomainError> {
        let request = Self::build_request(history, model_id, true);
        let response = self.send(&request).await?;

        forward_events(&self.name, response.bytes_stream(), &chunks).await
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ProviderAdapter;
use crate::domain::{latest_user_text, ConversationTurn, DomainError};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
    Chunks(Vec<String>),
    ChunksThenFail(Vec<String>, String),
    Echo,
}

/// Scripted in-process provider for tests and offline runs.
///
/// Every call waits for the configured delay, then plays its script.
pub struct MockProvider {
    script: Script,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockProvider {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_script(Script::Fail(message.into()))
    }

    pub fn streaming<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(Script::Chunks(chunks.into_iter().map(Into::into).collect()))
    }

    pub fn streaming_then_failing<I, S>(chunks: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(Script::ChunksThenFail(
            chunks.into_iter().map(Into::into).collect(),
            message.into(),
        ))
    }

    /// Replies with the model id and the latest user text.
    pub fn echo() -> Self {
        Self::with_script(Script::Echo)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

async fn send_chunk(chunks: &mpsc::Sender<String>, chunk: String) -> Result<(), DomainError> {
    chunks
        .send(chunk)
        .await
        .map_err(|_| DomainError::internal("stream receiver dropped"))
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
    ) -> Result<String, DomainError> {
        self.begin_call().await;

        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(message) | Script::ChunksThenFail(_, message) => {
                Err(DomainError::provider(message.clone()))
            }
            Script::Chunks(chunks) => Ok(chunks.concat()),
            Script::Echo => Ok(format!("[{model_id}] {}", latest_user_text(history))),
        }
    }

    async fn generate_stream(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
        chunks: mpsc::Sender<String>,
    ) -> Result<(), DomainError> {
        self.begin_call().await;

        match &self.script {
            Script::Reply(text) => {
                if !text.is_empty() {
                    send_chunk(&chunks, text.clone()).await?;
                }
                Ok(())
            }
            Script::Fail(message) => Err(DomainError::provider(message.clone())),
            Script::Chunks(scripted) => {
                for chunk in scripted {
                    send_chunk(&chunks, chunk.clone()).await?;
                }
                Ok(())
            }
            Script::ChunksThenFail(scripted, message) => {
                for chunk in scripted {
                    send_chunk(&chunks, chunk.clone()).await?;
                }
                Err(DomainError::provider(message.clone()))
            }
            Script::Echo => {
                send_chunk(&chunks, format!("[{model_id}] ")).await?;
                for word in latest_user_text(history).split_inclusive(' ') {
                    send_chunk(&chunks, word.to_string()).await?;
                }
                Ok(())
            }
        }
    }
}

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{ConversationTurn, DomainError};

/// Uniform interface to one LLM backend.
///
/// Implementors own transport, authentication and vendor-specific payloads.
/// The coordinator only ever sees text or an error.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Backend name used in logs (e.g. "anthropic", "openai").
    fn name(&self) -> &str;

    /// Produce a complete reply for `history` using `model_id`.
    async fn generate(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
    ) -> Result<String, DomainError>;

    /// Stream a reply as text fragments sent through `chunks`, in emission order.
    ///
    /// Returning `Ok(())` marks completion; returning `Err` marks failure. Both are
    /// terminal. Backends without native streaming emit the whole reply as one chunk.
    async fn generate_stream(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
        chunks: mpsc::Sender<String>,
    ) -> Result<(), DomainError> {
        let text = self.generate(history, model_id).await?;
        if !text.is_empty() {
            chunks
                .send(text)
                .await
                .map_err(|_| DomainError::internal("stream receiver dropped"))?;
        }
        Ok(())
    }
}

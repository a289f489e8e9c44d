use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::application::ProviderDescriptor;
use crate::domain::{ConversationTurn, ModelResponse};

/// Fans a conversation out to the selected providers concurrently.
///
/// Every provider races the same timeout on its own; a slow or failing
/// provider degrades to a failed [`ModelResponse`] without touching its siblings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelDispatcher;

impl ParallelDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch and keep only successful, non-empty responses.
    pub async fn dispatch(
        &self,
        history: &[ConversationTurn],
        selected: &[ProviderDescriptor],
        timeout: Duration,
    ) -> Vec<ModelResponse> {
        let settled = self.dispatch_all(history, selected, timeout).await;
        let total = settled.len();

        let responses: Vec<ModelResponse> = settled
            .into_iter()
            .filter(ModelResponse::is_successful)
            .collect();

        info!(
            "Dispatch round settled: {}/{} providers answered",
            responses.len(),
            total
        );

        responses
    }

    /// Dispatch and return one settled response per selected provider, failures included.
    ///
    /// Failed entries carry score 0 and the error or timeout reason as rationale.
    /// Durations are measured from the start of the round to each provider's settle.
    pub async fn dispatch_all(
        &self,
        history: &[ConversationTurn],
        selected: &[ProviderDescriptor],
        timeout: Duration,
    ) -> Vec<ModelResponse> {
        let started = Instant::now();
        debug!(
            "Dispatching to {} providers with {:.1}s timeout",
            selected.len(),
            timeout.as_secs_f64()
        );

        let calls = selected.iter().map(|descriptor| async move {
            let model_id = descriptor.id();
            let outcome =
                tokio::time::timeout(timeout, descriptor.adapter().generate(history, model_id))
                    .await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(Ok(text)) => {
                    debug!("{} answered in {:.2}s", model_id, elapsed.as_secs_f64());
                    ModelResponse::succeeded(model_id, text, elapsed)
                }
                Ok(Err(e)) => {
                    warn!("{} failed: {}", model_id, e);
                    ModelResponse::failed(model_id, e.to_string(), elapsed)
                }
                Err(_) => {
                    warn!(
                        "{} timed out after {:.1}s",
                        model_id,
                        timeout.as_secs_f64()
                    );
                    ModelResponse::failed(
                        model_id,
                        format!("timed out after {:.1}s", timeout.as_secs_f64()),
                        elapsed,
                    )
                }
            }
        });

        join_all(calls).await
    }
}

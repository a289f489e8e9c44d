use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::application::use_cases::classify_query::classify;
use crate::application::use_cases::dispatch::ParallelDispatcher;
use crate::application::use_cases::reduce::{reduce, FALLBACK_RESPONSE};
use crate::application::use_cases::score_response::ResponseScorer;
use crate::application::use_cases::select_models::select;
use crate::application::use_cases::stream_best::StreamingBridge;
use crate::application::{ProviderDescriptor, ProviderRegistry, StreamObserver};
use crate::domain::{
    latest_user_text, Category, ConversationTurn, CoordinatorOptions, DomainError, Strategy,
};

/// Entry point for the chat layer: classify, select, dispatch, score, reduce.
pub struct CoordinateUseCase {
    registry: Arc<ProviderRegistry>,
    dispatcher: ParallelDispatcher,
    scorer: ResponseScorer,
    bridge: StreamingBridge,
}

impl CoordinateUseCase {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            bridge: StreamingBridge::new(Arc::clone(&registry)),
            registry,
            dispatcher: ParallelDispatcher::new(),
            scorer: ResponseScorer::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: ResponseScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Category of the latest user turn and the providers that would answer it.
    pub fn plan(&self, history: &[ConversationTurn], count: usize) -> (Category, Vec<ProviderDescriptor>) {
        let category = classify(latest_user_text(history));
        let selected = select(category, count, self.registry.descriptors());
        (category, selected)
    }

    /// Non-streaming coordination. Always yields text: provider failures and
    /// timeouts degrade to [`FALLBACK_RESPONSE`] rather than an error.
    pub async fn coordinate(
        &self,
        history: &[ConversationTurn],
        options: &CoordinatorOptions,
    ) -> String {
        let start_time = Instant::now();

        let count = match options.strategy() {
            Strategy::Sequential => 1,
            _ => options.min_models(),
        };
        let (category, selected) = self.plan(history, count);

        info!(
            "Coordinating {} request with strategy {} across {} providers",
            category,
            options.strategy(),
            selected.len()
        );

        if selected.is_empty() {
            warn!("No providers selected for {} request; returning fallback response", category);
            return FALLBACK_RESPONSE.to_string();
        }

        let responses = self
            .dispatcher
            .dispatch(history, &selected, options.timeout())
            .await;

        let candidates = match options.strategy() {
            Strategy::Sequential => responses,
            _ => responses
                .into_iter()
                .map(|response| self.scorer.apply(response, category))
                .collect(),
        };

        let output = reduce(options.strategy(), &candidates);

        info!(
            "Coordinated {} candidates in {:.2}s",
            candidates.len(),
            start_time.elapsed().as_secs_f64()
        );

        output
    }

    /// Streaming coordination: relay the top provider for the detected category.
    ///
    /// Errors reach the caller only through `observer.on_error`.
    pub async fn coordinate_streaming(
        &self,
        history: &[ConversationTurn],
        observer: &mut dyn StreamObserver,
    ) {
        let category = classify(latest_user_text(history));
        self.bridge.stream_best(history, category, observer).await;
    }

    /// Ask one explicitly named model, skipping classification and selection.
    pub async fn respond_with(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
    ) -> Result<String, DomainError> {
        let descriptor = self.registry.resolve(model_id)?;
        info!("Direct request to {} via {}", model_id, descriptor.adapter().name());
        descriptor.adapter().generate(history, model_id).await
    }

    /// Stream from one explicitly named model. Unknown ids are reported via `on_error`.
    pub async fn stream_with(
        &self,
        history: &[ConversationTurn],
        model_id: &str,
        observer: &mut dyn StreamObserver,
    ) {
        match self.registry.resolve(model_id) {
            Ok(descriptor) => StreamingBridge::relay(descriptor, history, observer).await,
            Err(e) => observer.on_error(&e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::{ChannelObserver, StreamEvent};
    use crate::connector::MockProvider;
    use crate::domain::ModelProfile;

    fn use_case(providers: Vec<(&str, Category, Arc<MockProvider>)>) -> CoordinateUseCase {
        let descriptors = providers
            .into_iter()
            .map(|(id, category, provider)| {
                ProviderDescriptor::new(ModelProfile::new(id, category, "testing"), provider)
            })
            .collect();
        CoordinateUseCase::new(Arc::new(ProviderRegistry::new(descriptors).unwrap()))
            .with_scorer(ResponseScorer::new(2026))
    }

    #[tokio::test]
    async fn sequential_queries_only_the_top_provider() {
        let coder = Arc::new(MockProvider::replying("fn main() {}"));
        let general = Arc::new(MockProvider::replying("hello"));
        let coordinator = use_case(vec![
            ("general", Category::General, general.clone()),
            ("coder", Category::Code, coder.clone()),
        ]);

        let output = coordinator
            .coordinate(
                &[ConversationTurn::user("debug my code")],
                &CoordinatorOptions::new().with_strategy(Strategy::Sequential),
            )
            .await;

        assert_eq!(output, "fn main() {}");
        assert_eq!(coder.call_count(), 1);
        assert_eq!(general.call_count(), 0);
    }

    #[tokio::test]
    async fn all_failures_return_fallback() {
        let coordinator = use_case(vec![
            ("a", Category::General, Arc::new(MockProvider::failing("401 unauthorized"))),
            (
                "b",
                Category::General,
                Arc::new(MockProvider::replying("late").with_delay(Duration::from_secs(5))),
            ),
        ]);

        let output = coordinator
            .coordinate(
                &[ConversationTurn::user("hi")],
                &CoordinatorOptions::new().with_timeout(Duration::from_millis(50)),
            )
            .await;

        assert_eq!(output, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn empty_registry_returns_fallback() {
        let coordinator = CoordinateUseCase::new(Arc::new(ProviderRegistry::empty()));
        let output = coordinator
            .coordinate(&[ConversationTurn::user("hi")], &CoordinatorOptions::default())
            .await;
        assert_eq!(output, FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn min_models_limits_fan_out() {
        let providers: Vec<Arc<MockProvider>> =
            (0..4).map(|_| Arc::new(MockProvider::replying("answer"))).collect();
        let coordinator = use_case(
            ["a", "b", "c", "d"]
                .into_iter()
                .zip(providers.iter().cloned())
                .map(|(id, p)| (id, Category::General, p))
                .collect(),
        );

        coordinator
            .coordinate(
                &[ConversationTurn::user("hi")],
                &CoordinatorOptions::new().with_min_models(2),
            )
            .await;

        let calls: usize = providers.iter().map(|p| p.call_count()).sum();
        assert_eq!(calls, 2);
        assert_eq!(providers[0].call_count(), 1);
        assert_eq!(providers[1].call_count(), 1);
    }

    #[tokio::test]
    async fn respond_with_unknown_model_is_an_error() {
        let coordinator = use_case(vec![(
            "a",
            Category::General,
            Arc::new(MockProvider::replying("x")),
        )]);

        let err = coordinator
            .respond_with(&[ConversationTurn::user("hi")], "missing")
            .await
            .unwrap_err();
        assert!(err.is_unknown_model());

        let text = coordinator
            .respond_with(&[ConversationTurn::user("hi")], "a")
            .await
            .unwrap();
        assert_eq!(text, "x");
    }

    #[tokio::test]
    async fn stream_with_unknown_model_reports_error() {
        let coordinator = use_case(vec![]);
        let (mut observer, mut rx) = ChannelObserver::channel();

        coordinator
            .stream_with(&[ConversationTurn::user("hi")], "missing", &mut observer)
            .await;

        match rx.recv().await {
            Some(StreamEvent::Error(message)) => assert!(message.contains("missing")),
            other => panic!("expected error event, got {other:?}"),
        }
    }
}

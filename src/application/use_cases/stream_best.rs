use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::use_cases::select_models::select;
use crate::application::{ProviderDescriptor, ProviderRegistry, StreamObserver};
use crate::domain::{Category, ConversationTurn};

/// Chunks buffered between the adapter and the observer.
const CHUNK_BUFFER: usize = 64;

/// Relays one provider's chunk stream straight to the caller.
///
/// Only the top-ranked provider for the category is ever invoked; streams are
/// never merged.
pub struct StreamingBridge {
    registry: Arc<ProviderRegistry>,
}

impl StreamingBridge {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub async fn stream_best(
        &self,
        history: &[ConversationTurn],
        category: Category,
        observer: &mut dyn StreamObserver,
    ) {
        let Some(descriptor) = select(category, 1, self.registry.descriptors()).pop() else {
            warn!("No providers registered; cannot stream {} request", category);
            observer.on_error("no providers are configured");
            return;
        };

        info!("Streaming {} request from {}", category, descriptor.id());
        Self::relay(&descriptor, history, observer).await;
    }

    /// Forward chunks in emission order, then exactly one terminal callback.
    pub async fn relay(
        descriptor: &ProviderDescriptor,
        history: &[ConversationTurn],
        observer: &mut dyn StreamObserver,
    ) {
        let (tx, mut rx) = mpsc::channel::<String>(CHUNK_BUFFER);

        let producer = descriptor
            .adapter()
            .generate_stream(history, descriptor.id(), tx);

        let consumer = async {
            let mut forwarded = 0usize;
            while let Some(chunk) = rx.recv().await {
                observer.on_chunk(&chunk);
                forwarded += 1;
            }
            forwarded
        };

        // The channel closes once the producer returns, so every chunk is
        // delivered before the terminal callback below.
        let (result, forwarded) = tokio::join!(producer, consumer);

        match result {
            Ok(()) => {
                info!("{} streamed {} chunks", descriptor.id(), forwarded);
                observer.on_complete();
            }
            Err(e) => {
                warn!(
                    "{} stream failed after {} chunks: {}",
                    descriptor.id(),
                    forwarded,
                    e
                );
                observer.on_error(&e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ChannelObserver, StreamEvent};
    use crate::connector::MockProvider;
    use crate::domain::ModelProfile;

    #[derive(Default)]
    struct Recorder {
        chunks: Vec<String>,
        completions: usize,
        errors: Vec<String>,
    }

    impl StreamObserver for Recorder {
        fn on_chunk(&mut self, chunk: &str) {
            assert_eq!(self.completions + self.errors.len(), 0, "chunk after terminal");
            self.chunks.push(chunk.to_string());
        }

        fn on_complete(&mut self) {
            self.completions += 1;
        }

        fn on_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }
    }

    fn bridge(providers: Vec<(&str, Category, MockProvider)>) -> StreamingBridge {
        let descriptors = providers
            .into_iter()
            .map(|(id, category, provider)| {
                ProviderDescriptor::new(
                    ModelProfile::new(id, category, "testing"),
                    Arc::new(provider),
                )
            })
            .collect();
        StreamingBridge::new(Arc::new(ProviderRegistry::new(descriptors).unwrap()))
    }

    fn history() -> Vec<ConversationTurn> {
        vec![ConversationTurn::user("stream please")]
    }

    #[tokio::test]
    async fn chunks_arrive_in_order_then_complete_once() {
        let bridge = bridge(vec![(
            "streamer",
            Category::General,
            MockProvider::streaming(["a", "b", "c"]),
        )]);

        let mut recorder = Recorder::default();
        bridge
            .stream_best(&history(), Category::General, &mut recorder)
            .await;

        assert_eq!(recorder.chunks, vec!["a", "b", "c"]);
        assert_eq!(recorder.completions, 1);
        assert!(recorder.errors.is_empty());
    }

    #[tokio::test]
    async fn error_is_terminal_and_single() {
        let bridge = bridge(vec![(
            "flaky",
            Category::General,
            MockProvider::streaming_then_failing(["partial"], "connection reset"),
        )]);

        let mut recorder = Recorder::default();
        bridge
            .stream_best(&history(), Category::General, &mut recorder)
            .await;

        assert_eq!(recorder.chunks, vec!["partial"]);
        assert_eq!(recorder.completions, 0);
        assert_eq!(recorder.errors.len(), 1);
        assert!(recorder.errors[0].contains("connection reset"));
    }

    #[tokio::test]
    async fn only_the_top_ranked_provider_is_invoked() {
        let general = Arc::new(MockProvider::streaming(["general"]));
        let coder = Arc::new(MockProvider::streaming(["coder"]));
        let registry = ProviderRegistry::new(vec![
            ProviderDescriptor::new(
                ModelProfile::new("general", Category::General, "Versatile"),
                general.clone(),
            ),
            ProviderDescriptor::new(
                ModelProfile::new("coder", Category::Code, "Code generation"),
                coder.clone(),
            ),
        ])
        .unwrap();
        let bridge = StreamingBridge::new(Arc::new(registry));

        let (mut observer, mut rx) = ChannelObserver::channel();
        bridge
            .stream_best(&history(), Category::Code, &mut observer)
            .await;

        assert_eq!(rx.recv().await, Some(StreamEvent::Chunk("coder".into())));
        assert_eq!(rx.recv().await, Some(StreamEvent::Complete));
        assert_eq!(coder.call_count(), 1);
        assert_eq!(general.call_count(), 0);
    }

    #[tokio::test]
    async fn non_streaming_adapter_emits_one_chunk() {
        let bridge = bridge(vec![(
            "plain",
            Category::General,
            MockProvider::replying("whole answer"),
        )]);

        let mut recorder = Recorder::default();
        bridge
            .stream_best(&history(), Category::General, &mut recorder)
            .await;

        assert_eq!(recorder.chunks, vec!["whole answer"]);
        assert_eq!(recorder.completions, 1);
    }

    #[tokio::test]
    async fn empty_registry_reports_error() {
        let bridge = StreamingBridge::new(Arc::new(ProviderRegistry::empty()));

        let mut recorder = Recorder::default();
        bridge
            .stream_best(&history(), Category::General, &mut recorder)
            .await;

        assert!(recorder.chunks.is_empty());
        assert_eq!(recorder.completions, 0);
        assert_eq!(recorder.errors.len(), 1);
    }
}

pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    classify, fitness_label, reduce, select, ChannelObserver, CoordinateUseCase, ParallelDispatcher,
    ProviderAdapter, ProviderDescriptor, ProviderRegistry, ResponseScorer, StreamEvent,
    StreamObserver, StreamingBridge, FALLBACK_RESPONSE,
};

pub use connector::{
    build_registry, AnthropicClient, Backend, ChorusConfig, Container, ContainerConfig, MockProvider,
    OpenAiCompatibleClient, ProviderConfig,
};

pub use domain::{
    latest_user_text, Category, ConversationTurn, CoordinatorOptions, DomainError, ModelProfile,
    ModelResponse, Role, Strategy,
};

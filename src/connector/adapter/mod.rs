pub mod anthropic_client;
mod mock_provider;
pub mod openai_client;

pub use anthropic_client::AnthropicClient;
pub use mock_provider::*;
pub use openai_client::OpenAiCompatibleClient;

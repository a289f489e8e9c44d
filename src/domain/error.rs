use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("No providers available: {0}")]
    NoProviders(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderError(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn unknown_model(msg: impl Into<String>) -> Self {
        Self::UnknownModel(msg.into())
    }

    pub fn no_providers(msg: impl Into<String>) -> Self {
        Self::NoProviders(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_unknown_model(&self) -> bool {
        matches!(self, Self::UnknownModel(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::ProviderError(_))
    }
}

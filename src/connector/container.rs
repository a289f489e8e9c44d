use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::application::{CoordinateUseCase, ProviderAdapter, ProviderDescriptor, ProviderRegistry};
use crate::connector::config::{Backend, ChorusConfig, ProviderConfig};
use crate::connector::adapter::{AnthropicClient, MockProvider, OpenAiCompatibleClient};
use crate::domain::{CoordinatorOptions, DomainError, ModelProfile};

pub struct ContainerConfig {
    /// JSON catalog; when absent the catalog is built from environment variables.
    pub config_path: Option<PathBuf>,
    /// Serve every built-in model from in-process mocks instead of HTTP.
    pub mock_providers: bool,
}

/// Wires configuration, adapters and the registry together once at startup.
pub struct Container {
    registry: Arc<ProviderRegistry>,
    options: CoordinatorOptions,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let chorus_config = if config.mock_providers {
            debug!("Using mock providers");
            ChorusConfig::mock()
        } else if let Some(path) = config.config_path.as_deref() {
            debug!("Loading provider catalog from {}", path.display());
            ChorusConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        } else {
            debug!("Building provider catalog from environment");
            ChorusConfig::from_env()
        };

        let registry = build_registry(&chorus_config, |key| std::env::var(key).ok())?;
        if registry.is_empty() {
            warn!("No providers configured; set an API key such as OPENAI_API_KEY or pass --mock");
        } else {
            info!("Registered {} models", registry.len());
        }

        Ok(Self {
            registry: Arc::new(registry),
            options: chorus_config.options,
        })
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Default coordinator options from the config file.
    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn coordinate_use_case(&self) -> CoordinateUseCase {
        CoordinateUseCase::new(Arc::clone(&self.registry))
    }
}

/// Build the registry, creating one adapter per distinct endpoint and key.
///
/// API keys are read through `lookup` so callers decide where secrets come from.
pub fn build_registry(
    config: &ChorusConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProviderRegistry, DomainError> {
    let mut adapters: HashMap<(Backend, String, String, String), Arc<dyn ProviderAdapter>> =
        HashMap::new();
    let mut descriptors = Vec::with_capacity(config.providers.len());

    for provider in &config.providers {
        let adapter = match provider.backend {
            // Each mock model gets its own provider so call counts stay per model.
            Backend::Mock => Arc::new(MockProvider::echo()) as Arc<dyn ProviderAdapter>,
            backend => {
                let key = (
                    backend,
                    provider.label().to_string(),
                    provider.base_url().unwrap_or_default().to_string(),
                    provider.api_key_env.clone().unwrap_or_default(),
                );
                match adapters.get(&key) {
                    Some(adapter) => Arc::clone(adapter),
                    None => {
                        let adapter = create_adapter(provider, &lookup)?;
                        adapters.insert(key, Arc::clone(&adapter));
                        adapter
                    }
                }
            }
        };

        descriptors.push(ProviderDescriptor::new(
            ModelProfile::new(provider.id.clone(), provider.category, provider.strength.clone()),
            adapter,
        ));
    }

    ProviderRegistry::new(descriptors)
}

fn create_adapter(
    provider: &ProviderConfig,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn ProviderAdapter>, DomainError> {
    let key_env = provider.api_key_env.as_deref().ok_or_else(|| {
        DomainError::config(format!("provider '{}' needs api_key_env", provider.id))
    })?;
    let api_key = lookup(key_env).ok_or_else(|| {
        DomainError::config(format!(
            "environment variable {key_env} is not set (needed by '{}')",
            provider.id
        ))
    })?;
    let base_url = provider.base_url().unwrap_or_default();

    debug!("Creating {} adapter for {}", provider.label(), base_url);

    let adapter: Arc<dyn ProviderAdapter> = match provider.backend {
        Backend::Anthropic => Arc::new(AnthropicClient::new(api_key, base_url)),
        Backend::OpenAi => Arc::new(OpenAiCompatibleClient::new(
            provider.label(),
            api_key,
            base_url,
        )),
        Backend::Mock => Arc::new(MockProvider::echo()),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    fn openai_entry(id: &str) -> ProviderConfig {
        ProviderConfig {
            id: id.to_string(),
            category: Category::General,
            strength: "General chat".to_string(),
            backend: Backend::OpenAi,
            provider: None,
            base_url: None,
            api_key_env: Some("TEST_OPENAI_KEY".to_string()),
        }
    }

    #[test]
    fn models_on_the_same_endpoint_share_an_adapter() {
        let config = ChorusConfig {
            options: CoordinatorOptions::default(),
            providers: vec![openai_entry("gpt-4o"), openai_entry("gpt-4o-mini")],
        };

        let registry = build_registry(&config, |_| Some("sk-test".to_string())).unwrap();
        let first = registry.resolve("gpt-4o").unwrap();
        let second = registry.resolve("gpt-4o-mini").unwrap();
        assert!(Arc::ptr_eq(first.adapter(), second.adapter()));
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let config = ChorusConfig {
            options: CoordinatorOptions::default(),
            providers: vec![openai_entry("gpt-4o")],
        };

        let err = build_registry(&config, |_| None).unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
    }

    #[test]
    fn mock_container_registers_builtin_catalog() {
        let container = Container::new(ContainerConfig {
            config_path: None,
            mock_providers: true,
        })
        .unwrap();

        assert!(container.registry().contains("gpt-4o"));
        assert!(container.registry().contains("claude-sonnet-4-5"));
        assert_eq!(container.options(), &CoordinatorOptions::default());
    }
}

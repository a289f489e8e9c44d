use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::connector::adapter::{anthropic_client, openai_client};
use crate::domain::{Category, CoordinatorOptions, DomainError};

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Mock,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Anthropic => "anthropic",
            Backend::OpenAi => "openai",
            Backend::Mock => "mock",
        }
    }

    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Backend::Anthropic => Some(anthropic_client::DEFAULT_BASE_URL),
            Backend::OpenAi => Some(openai_client::DEFAULT_BASE_URL),
            Backend::Mock => None,
        }
    }
}

/// One model entry of the provider catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub category: Category,
    pub strength: String,
    pub backend: Backend,
    /// Label used in logs; defaults to the backend name.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl ProviderConfig {
    pub fn label(&self) -> &str {
        self.provider.as_deref().unwrap_or(self.backend.as_str())
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.backend.default_base_url())
    }
}

/// Top-level configuration file: default coordinator options plus the catalog.
///
/// ```json
/// {
///   "options": { "strategy": "best", "min_models": 3, "timeout_secs": 30 },
///   "providers": [
///     { "id": "gpt-4o", "category": "general", "strength": "Versatile reasoning",
///       "backend": "openai", "api_key_env": "OPENAI_API_KEY" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChorusConfig {
    #[serde(default)]
    pub options: CoordinatorOptions,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Built-in catalog entry used when no config file is given.
struct CatalogEntry {
    env_prefix: &'static str,
    provider: &'static str,
    backend: Backend,
    base_url: &'static str,
    id: &'static str,
    category: Category,
    strength: &'static str,
}

const DEFAULT_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        env_prefix: "OPENAI",
        provider: "openai",
        backend: Backend::OpenAi,
        base_url: openai_client::DEFAULT_BASE_URL,
        id: "gpt-4o",
        category: Category::General,
        strength: "Versatile reasoning and conversation",
    },
    CatalogEntry {
        env_prefix: "ANTHROPIC",
        provider: "anthropic",
        backend: Backend::Anthropic,
        base_url: anthropic_client::DEFAULT_BASE_URL,
        id: "claude-sonnet-4-5",
        category: Category::Code,
        strength: "Code generation and debugging",
    },
    CatalogEntry {
        env_prefix: "XAI",
        provider: "xai",
        backend: Backend::OpenAi,
        base_url: "https://api.x.ai/v1",
        id: "grok-3",
        category: Category::Realtime,
        strength: "Real-time information and current events",
    },
    CatalogEntry {
        env_prefix: "PERPLEXITY",
        provider: "perplexity",
        backend: Backend::OpenAi,
        base_url: "https://api.perplexity.ai",
        id: "sonar-pro",
        category: Category::Search,
        strength: "Web research with citations",
    },
    CatalogEntry {
        env_prefix: "GEMINI",
        provider: "gemini",
        backend: Backend::OpenAi,
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        id: "gemini-2.5-pro",
        category: Category::Multimodal,
        strength: "Image and document understanding",
    },
    CatalogEntry {
        env_prefix: "DEEPSEEK",
        provider: "deepseek",
        backend: Backend::OpenAi,
        base_url: "https://api.deepseek.com/v1",
        id: "deepseek-chat",
        category: Category::General,
        strength: "Analytical reasoning and code review",
    },
];

impl ChorusConfig {
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Catalog of every built-in provider whose `<PREFIX>_API_KEY` is set.
    /// `<PREFIX>_BASE_URL` overrides the endpoint.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let providers = DEFAULT_CATALOG
            .iter()
            .filter(|entry| {
                lookup(&format!("{}_API_KEY", entry.env_prefix))
                    .is_some_and(|key| !key.trim().is_empty())
            })
            .map(|entry| ProviderConfig {
                id: entry.id.to_string(),
                category: entry.category,
                strength: entry.strength.to_string(),
                backend: entry.backend,
                provider: Some(entry.provider.to_string()),
                base_url: Some(
                    lookup(&format!("{}_BASE_URL", entry.env_prefix))
                        .unwrap_or_else(|| entry.base_url.to_string()),
                ),
                api_key_env: Some(format!("{}_API_KEY", entry.env_prefix)),
            })
            .collect();

        Self {
            options: CoordinatorOptions::default(),
            providers,
        }
    }

    /// The built-in catalog served entirely by in-process mock providers.
    pub fn mock() -> Self {
        let providers = DEFAULT_CATALOG
            .iter()
            .map(|entry| ProviderConfig {
                id: entry.id.to_string(),
                category: entry.category,
                strength: entry.strength.to_string(),
                backend: Backend::Mock,
                provider: Some(format!("mock-{}", entry.provider)),
                base_url: None,
                api_key_env: None,
            })
            .collect();

        Self {
            options: CoordinatorOptions::default(),
            providers,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(DomainError::config("provider id must not be empty"));
            }
            // Analysis is a request category only; providers never carry it.
            if provider.category == Category::Analysis {
                return Err(DomainError::config(format!(
                    "provider '{}' cannot be tagged analysis",
                    provider.id
                )));
            }
            if provider.backend != Backend::Mock && provider.api_key_env.is_none() {
                return Err(DomainError::config(format!(
                    "provider '{}' needs api_key_env",
                    provider.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::domain::Strategy;

    #[test]
    fn env_catalog_includes_only_configured_keys() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("XAI_API_KEY", "xai-test"),
            ("XAI_BASE_URL", "http://localhost:9000/v1"),
            ("GEMINI_API_KEY", "  "),
        ]);
        let config = ChorusConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        let ids: Vec<&str> = config.providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["gpt-4o", "grok-3"]);
        assert_eq!(
            config.providers[1].base_url(),
            Some("http://localhost:9000/v1")
        );
        assert_eq!(config.providers[1].label(), "xai");
    }

    #[test]
    fn mock_catalog_needs_no_keys() {
        let config = ChorusConfig::mock();
        assert_eq!(config.providers.len(), DEFAULT_CATALOG.len());
        assert!(config.providers.iter().all(|p| p.backend == Backend::Mock));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "options": {{ "strategy": "parallel", "min_models": 2 }},
                "providers": [
                    {{ "id": "local", "category": "code", "strength": "Coding",
                       "backend": "openai", "base_url": "http://localhost:1234/v1",
                       "api_key_env": "LOCAL_KEY" }}
                ]
            }}"#
        )
        .unwrap();

        let config = ChorusConfig::from_file(file.path()).unwrap();
        assert_eq!(config.options.strategy(), Strategy::Parallel);
        assert_eq!(config.options.min_models(), 2);
        assert_eq!(config.providers[0].category, Category::Code);
        assert_eq!(config.providers[0].base_url(), Some("http://localhost:1234/v1"));
    }

    #[test]
    fn missing_key_env_is_rejected() {
        let err = ChorusConfig::from_json(
            r#"{"providers":[{"id":"x","category":"general","strength":"s","backend":"anthropic"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
    }

    #[test]
    fn analysis_provider_tag_is_rejected() {
        let err = ChorusConfig::from_json(
            r#"{"providers":[{"id":"x","category":"analysis","strength":"s","backend":"mock"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
    }

    #[test]
    fn default_base_url_applies_when_unset() {
        let provider = ProviderConfig {
            id: "claude".into(),
            category: Category::Code,
            strength: "Coding".into(),
            backend: Backend::Anthropic,
            provider: None,
            base_url: None,
            api_key_env: Some("ANTHROPIC_API_KEY".into()),
        };
        assert_eq!(provider.base_url(), Some(anthropic_client::DEFAULT_BASE_URL));
        assert_eq!(provider.label(), "anthropic");
    }
}

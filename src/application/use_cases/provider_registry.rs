use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ProviderAdapter;
use crate::domain::{Category, DomainError, ModelProfile};

/// A model profile bound to the adapter that serves it.
///
/// Cloning is cheap; several descriptors may share one adapter.
#[derive(Clone)]
pub struct ProviderDescriptor {
    profile: ModelProfile,
    adapter: Arc<dyn ProviderAdapter>,
}

impl ProviderDescriptor {
    pub fn new(profile: ModelProfile, adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self { profile, adapter }
    }

    pub fn id(&self) -> &str {
        self.profile.id()
    }

    pub fn category(&self) -> Category {
        self.profile.category()
    }

    pub fn strength(&self) -> &str {
        self.profile.strength()
    }

    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    pub fn adapter(&self) -> &Arc<dyn ProviderAdapter> {
        &self.adapter
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("profile", &self.profile)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

/// Read-only catalog of the models available to the coordinator.
///
/// Model ids are resolved to adapters once, here; declaration order is kept
/// because selection breaks ties by it.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
    index: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            if descriptor.id().trim().is_empty() {
                return Err(DomainError::config("provider model id must not be empty"));
            }
            if index.insert(descriptor.id().to_string(), position).is_some() {
                return Err(DomainError::config(format!(
                    "model id '{}' is registered more than once",
                    descriptor.id()
                )));
            }
        }
        Ok(Self { descriptors, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    pub fn resolve(&self, model_id: &str) -> Result<&ProviderDescriptor, DomainError> {
        self.index
            .get(model_id)
            .map(|&position| &self.descriptors[position])
            .ok_or_else(|| DomainError::unknown_model(model_id))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.index.contains_key(model_id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

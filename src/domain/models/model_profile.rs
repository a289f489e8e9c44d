use serde::{Deserialize, Serialize};

use super::Category;

/// Static description of a model a provider serves: its id, the category it
/// is tagged for, and a short human-readable strength label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    id: String,
    category: Category,
    strength: String,
}

impl ModelProfile {
    pub fn new(id: impl Into<String>, category: Category, strength: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            strength: strength.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn strength(&self) -> &str {
        &self.strength
    }
}

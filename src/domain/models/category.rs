use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Coarse task classification of a user request, used to rank providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Code,
    Realtime,
    Search,
    Multimodal,
    Analysis,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::Code,
        Category::Realtime,
        Category::Search,
        Category::Multimodal,
        Category::Analysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Code => "code",
            Category::Realtime => "realtime",
            Category::Search => "search",
            Category::Multimodal => "multimodal",
            Category::Analysis => "analysis",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(Category::General),
            "code" => Ok(Category::Code),
            "realtime" | "real-time" => Ok(Category::Realtime),
            "search" => Ok(Category::Search),
            "multimodal" => Ok(Category::Multimodal),
            "analysis" => Ok(Category::Analysis),
            other => Err(DomainError::invalid_input(format!(
                "unknown category '{other}'"
            ))),
        }
    }
}

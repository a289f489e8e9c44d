use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_MIN_MODELS: usize = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How candidate responses are reduced into one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Highest score wins, optionally enriched by a close runner-up.
    #[default]
    Best,
    /// Top response plus novel excerpts from the next two.
    Consensus,
    /// Every response side by side, best first.
    Parallel,
    /// Single top-ranked provider, relayed as-is.
    #[serde(alias = "passthrough")]
    Sequential,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Best => "best",
            Strategy::Consensus => "consensus",
            Strategy::Parallel => "parallel",
            Strategy::Sequential => "sequential",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best" => Ok(Strategy::Best),
            "consensus" => Ok(Strategy::Consensus),
            "parallel" => Ok(Strategy::Parallel),
            "sequential" | "passthrough" => Ok(Strategy::Sequential),
            other => Err(DomainError::invalid_input(format!(
                "unknown strategy '{other}'"
            ))),
        }
    }
}

/// Per-call configuration of a coordination round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorOptions {
    strategy: Strategy,
    #[serde(deserialize_with = "at_least_one")]
    min_models: usize,
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    timeout: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            min_models: DEFAULT_MIN_MODELS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CoordinatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_min_models(mut self, min_models: usize) -> Self {
        // Always query at least one provider
        self.min_models = min_models.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn min_models(&self) -> usize {
        self.min_models
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Every round queries at least one provider, however the options were built.
fn at_least_one<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    Ok(usize::deserialize(deserializer)?.max(1))
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("timeout_secs must be a non-negative number"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = CoordinatorOptions::default();
        assert_eq!(options.strategy(), Strategy::Best);
        assert_eq!(options.min_models(), 3);
        assert_eq!(options.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn min_models_never_drops_to_zero() {
        assert_eq!(CoordinatorOptions::new().with_min_models(0).min_models(), 1);
    }

    #[test]
    fn deserialized_min_models_never_drops_to_zero() {
        let options: CoordinatorOptions = serde_json::from_str(r#"{"min_models":0}"#).unwrap();
        assert_eq!(options.min_models(), 1);
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let options: CoordinatorOptions =
            serde_json::from_str(r#"{"strategy":"consensus","timeout_secs":2.5}"#).unwrap();
        assert_eq!(options.strategy(), Strategy::Consensus);
        assert_eq!(options.min_models(), DEFAULT_MIN_MODELS);
        assert_eq!(options.timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn passthrough_is_an_alias_for_sequential() {
        assert_eq!("passthrough".parse::<Strategy>().unwrap(), Strategy::Sequential);
        let strategy: Strategy = serde_json::from_str("\"passthrough\"").unwrap();
        assert_eq!(strategy, Strategy::Sequential);
    }

    #[test]
    fn rejects_negative_timeout() {
        let result = serde_json::from_str::<CoordinatorOptions>(r#"{"timeout_secs":-1}"#);
        assert!(result.is_err());
    }
}

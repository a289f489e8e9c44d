use std::time::Duration;

use chrono::Datelike;

use crate::domain::{Category, ModelResponse, MAX_SCORE};

pub const BASE_SCORE: u32 = 50;

const LONG_RESPONSE_CHARS: usize = 100;
const VERY_LONG_RESPONSE_CHARS: usize = 500;
const FAST_RESPONSE: Duration = Duration::from_secs(5);
const VERY_FAST_RESPONSE: Duration = Duration::from_secs(2);

/// Category-aware heuristic quality score in `[0, 100]`.
///
/// Pure: the only outside input, the year used for realtime answers, is fixed
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseScorer {
    current_year: i32,
}

impl Default for ResponseScorer {
    fn default() -> Self {
        Self::new(chrono::Local::now().year())
    }
}

impl ResponseScorer {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn score(&self, response: &ModelResponse, category: Category) -> u32 {
        self.assess(response, category).0
    }

    /// Score plus a rationale listing every bonus that applied.
    pub fn assess(&self, response: &ModelResponse, category: Category) -> (u32, String) {
        let text = response.text();
        let lowered = text.to_lowercase();
        let length = text.chars().count();

        let mut score = BASE_SCORE;
        let mut reasons = vec![format!("base {BASE_SCORE}")];
        let mut bonus = |points: u32, reason: &str| {
            score += points;
            reasons.push(format!("+{points} {reason}"));
        };

        if length > LONG_RESPONSE_CHARS {
            bonus(10, "detailed");
        }
        if length > VERY_LONG_RESPONSE_CHARS {
            bonus(10, "comprehensive");
        }
        if text.contains("```") {
            bonus(15, "code block");
        }
        if lowered.contains("http") {
            bonus(5, "links");
        }

        match category {
            Category::Code if lowered.contains("function") || lowered.contains("class") => {
                bonus(20, "code terminology")
            }
            Category::Search
                if lowered.contains("according to") || lowered.contains("source") =>
            {
                bonus(15, "attribution")
            }
            Category::Realtime if text.contains(&self.current_year.to_string()) => {
                bonus(10, "current year")
            }
            _ => {}
        }

        // Both thresholds apply independently: under 2s earns both bonuses.
        if response.duration() < FAST_RESPONSE {
            bonus(5, "fast");
        }
        if response.duration() < VERY_FAST_RESPONSE {
            bonus(10, "very fast");
        }

        (score.min(MAX_SCORE), reasons.join(", "))
    }

    /// Attach score and rationale to `response`.
    pub fn apply(&self, response: ModelResponse, category: Category) -> ModelResponse {
        let (score, rationale) = self.assess(&response, category);
        response.with_score(score, rationale)
    }
}

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{ModelResponse, Strategy};

/// Returned by every non-streaming strategy when no candidate survived dispatch.
pub const FALLBACK_RESPONSE: &str =
    "I apologize, but I couldn't get a response from any of the available models right now. Please try again in a moment.";

/// A runner-up within this many points of the winner is considered for merging.
pub const RUNNER_UP_MARGIN: u32 = 10;

/// Share of a candidate's tokens that must be absent from the reference
/// before its excerpt is appended. Tunable heuristic.
pub const NOVELTY_THRESHOLD: f64 = 0.3;

/// Characters kept from a merged candidate. Tunable heuristic.
pub const EXCERPT_CHARS: usize = 200;

/// How many responses the consensus strategy blends.
pub const CONSENSUS_SIZE: usize = 3;

/// Reduce scored candidates to a single answer using `strategy`.
pub fn reduce(strategy: Strategy, responses: &[ModelResponse]) -> String {
    match strategy {
        Strategy::Best => reduce_best(responses),
        Strategy::Consensus => reduce_consensus(responses),
        Strategy::Parallel => reduce_parallel(responses),
        Strategy::Sequential => reduce_passthrough(responses),
    }
}

/// Highest score wins; a close runner-up from another provider contributes an
/// excerpt when enough of its wording is new.
pub fn reduce_best(responses: &[ModelResponse]) -> String {
    let ranked = rank(responses);
    let Some(winner) = ranked.first() else {
        return FALLBACK_RESPONSE.to_string();
    };

    let mut output = winner.text().to_string();

    let runner_up = ranked
        .iter()
        .skip(1)
        .find(|candidate| candidate.model_id() != winner.model_id());

    if let Some(runner_up) = runner_up {
        let gap = winner.score().saturating_sub(runner_up.score());
        if gap <= RUNNER_UP_MARGIN {
            if let Some(insight) = unique_insight(runner_up, winner.text()) {
                debug!(
                    "Merging runner-up {} ({} points behind {})",
                    runner_up.model_id(),
                    gap,
                    winner.model_id()
                );
                output.push_str(&insight);
            }
        }
    }

    output
}

/// Top response plus novel excerpts from the next two, best first.
pub fn reduce_consensus(responses: &[ModelResponse]) -> String {
    let ranked = rank(responses);
    let Some((top, rest)) = ranked.split_first() else {
        return FALLBACK_RESPONSE.to_string();
    };

    let mut output = top.text().to_string();
    for candidate in rest.iter().take(CONSENSUS_SIZE - 1) {
        if let Some(insight) = unique_insight(candidate, top.text()) {
            output.push_str(&insight);
        }
    }

    output
}

/// Every response side by side, labelled with model and score, best first.
pub fn reduce_parallel(responses: &[ModelResponse]) -> String {
    let ranked = rank(responses);
    if ranked.is_empty() {
        return FALLBACK_RESPONSE.to_string();
    }

    ranked
        .iter()
        .map(|response| {
            format!(
                "**{}** (score: {})\n\n{}",
                response.model_id(),
                response.score(),
                response.text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// The single top response, untouched.
pub fn reduce_passthrough(responses: &[ModelResponse]) -> String {
    rank(responses)
        .first()
        .map(|response| response.text().to_string())
        .unwrap_or_else(|| FALLBACK_RESPONSE.to_string())
}

/// Labelled excerpt of `candidate` if more than [`NOVELTY_THRESHOLD`] of its
/// tokens are missing from `reference`.
pub fn unique_insight(candidate: &ModelResponse, reference: &str) -> Option<String> {
    if novel_token_ratio(candidate.text(), reference) <= NOVELTY_THRESHOLD {
        return None;
    }

    Some(format!(
        "\n\n**Additional Insight ({}):**\n{}",
        candidate.model_id(),
        excerpt(candidate.text(), EXCERPT_CHARS)
    ))
}

/// Fraction of `candidate`'s whitespace tokens (lower-cased) absent from `reference`.
pub fn novel_token_ratio(candidate: &str, reference: &str) -> f64 {
    let known: HashSet<String> = reference
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let tokens: Vec<String> = candidate
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    if tokens.is_empty() {
        return 0.0;
    }

    let novel = tokens.iter().filter(|token| !known.contains(*token)).count();
    novel as f64 / tokens.len() as f64
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Successful responses, highest score first; faster wins a tie, then input order.
fn rank(responses: &[ModelResponse]) -> Vec<&ModelResponse> {
    let mut ranked: Vec<&ModelResponse> = responses
        .iter()
        .filter(|response| response.is_successful())
        .collect();
    ranked.sort_by(|a, b| {
        b.score()
            .cmp(&a.score())
            .then_with(|| a.duration().cmp(&b.duration()))
    });
    ranked
}

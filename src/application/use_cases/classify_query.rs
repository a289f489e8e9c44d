use crate::domain::Category;

const CODE_KEYWORDS: &[&str] = &["code", "program", "debug", "function"];
const REALTIME_KEYWORDS: &[&str] = &["current", "latest", "news", "recent"];
const SEARCH_KEYWORDS: &[&str] = &["research", "search", "find", "information"];
const VISUAL_KEYWORDS: &[&str] = &["image", "visual", "picture"];
const ANALYSIS_KEYWORDS: &[&str] = &["analyze", "review", "explain", "compare"];

/// Classify the latest user utterance into a task [`Category`].
///
/// Case-insensitive substring matching, first hit wins in priority order:
/// code, realtime, search, multimodal (a visual keyword together with
/// "analyze"), analysis. Anything else, including blank input, is `General`.
pub fn classify(text: &str) -> Category {
    let lowered = text.to_lowercase();

    if lowered.trim().is_empty() {
        return Category::General;
    }

    if contains_any(&lowered, CODE_KEYWORDS) {
        return Category::Code;
    }
    if contains_any(&lowered, REALTIME_KEYWORDS) {
        return Category::Realtime;
    }
    if contains_any(&lowered, SEARCH_KEYWORDS) {
        return Category::Search;
    }
    if contains_any(&lowered, VISUAL_KEYWORDS) && lowered.contains("analyze") {
        return Category::Multimodal;
    }
    if contains_any(&lowered, ANALYSIS_KEYWORDS) {
        return Category::Analysis;
    }

    Category::General
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_request_is_code() {
        assert_eq!(classify("Please debug this function"), Category::Code);
    }

    #[test]
    fn news_request_is_realtime() {
        assert_eq!(classify("What's the latest news today?"), Category::Realtime);
    }

    #[test]
    fn research_request_is_search() {
        assert_eq!(classify("Research the history of Rome"), Category::Search);
    }

    #[test]
    fn visual_keyword_needs_analyze_for_multimodal() {
        assert_eq!(classify("Analyze this picture of a cat"), Category::Multimodal);
        assert_eq!(classify("Draw me a picture"), Category::General);
    }

    #[test]
    fn analysis_without_visual_keyword() {
        assert_eq!(classify("Compare Kant and Hume"), Category::Analysis);
        assert_eq!(classify("Analyze the poem's meter"), Category::Analysis);
    }

    #[test]
    fn priority_order_resolves_overlaps() {
        // code beats everything else
        assert_eq!(classify("Explain the latest code review"), Category::Code);
        // realtime beats search
        assert_eq!(classify("Search for recent papers"), Category::Realtime);
        // search beats multimodal
        assert_eq!(classify("Find and analyze this image"), Category::Search);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("DEBUG MY PROGRAM"), Category::Code);
    }

    #[test]
    fn blank_input_is_general() {
        assert_eq!(classify(""), Category::General);
        assert_eq!(classify("   \n\t"), Category::General);
        assert_eq!(classify("Tell me a joke"), Category::General);
    }

    #[test]
    fn classification_is_deterministic() {
        let inputs = [
            "Please debug this function",
            "What's new?",
            "Analyze this image",
            "hello",
        ];
        for input in inputs {
            assert_eq!(classify(input), classify(input));
        }
    }
}

//! Keyword scoring helpers shared by personality implementations.
//!
//! These are deliberately simple: an interest matches a topic when either
//! contains the other (case-insensitive). Implementations are free to layer
//! their own weighting on top.

/// Relevance of `topics` to a set of interest keywords, in `[0, 1]`.
///
/// No match scores 0. Any match scores at least 0.5, rising linearly to 1.0
/// when every topic matches.
pub fn keyword_relevance(interests: &[String], topics: &[String]) -> f64 {
    if interests.is_empty() || topics.is_empty() {
        return 0.0;
    }
    let matched = topics
        .iter()
        .filter(|topic| interests.iter().any(|i| keyword_matches(i, topic)))
        .count();
    if matched == 0 {
        return 0.0;
    }
    0.5 + 0.5 * (matched as f64 / topics.len() as f64)
}

/// Number of interest keywords that occur in `text` (case-insensitive).
pub fn text_keyword_hits(interests: &[String], text: &str) -> usize {
    let lowered = text.to_lowercase();
    interests
        .iter()
        .filter(|i| {
            let needle = i.trim().to_lowercase();
            !needle.is_empty() && lowered.contains(&needle)
        })
        .count()
}

/// Whether the text contains any of the phrases (case-insensitive).
pub fn contains_any_phrase(text: &str, phrases: &[String]) -> bool {
    let lowered = text.to_lowercase();
    phrases.iter().any(|p| {
        let needle = p.trim().to_lowercase();
        !needle.is_empty() && lowered.contains(&needle)
    })
}

/// Fraction of `history` entries that share at least one interest hit with
/// `text`. Used to damp repetition.
pub fn repetition_ratio(interests: &[String], history: &[String], text: &str) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    let lowered = text.to_lowercase();
    let active: Vec<String> = interests
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty() && lowered.contains(i.as_str()))
        .collect();
    if active.is_empty() {
        return 0.0;
    }
    let repeats = history
        .iter()
        .filter(|h| {
            let h = h.to_lowercase();
            active.iter().any(|i| h.contains(i.as_str()))
        })
        .count();
    repeats as f64 / history.len() as f64
}

fn keyword_matches(interest: &str, topic: &str) -> bool {
    let interest = interest.trim().to_lowercase();
    let topic = topic.trim().to_lowercase();
    if interest.is_empty() || topic.is_empty() {
        return false;
    }
    interest.contains(&topic) || topic.contains(&interest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn relevance_is_zero_without_overlap() {
        assert_eq!(
            keyword_relevance(&words(&["economy"]), &words(&["sports"])),
            0.0
        );
        assert_eq!(keyword_relevance(&[], &words(&["sports"])), 0.0);
        assert_eq!(keyword_relevance(&words(&["economy"]), &[]), 0.0);
    }

    #[test]
    fn relevance_scales_with_matched_fraction() {
        let interests = words(&["economy", "markets"]);
        let one_of_two = keyword_relevance(&interests, &words(&["economy", "sports"]));
        assert!((one_of_two - 0.75).abs() < 1e-9);
        let all = keyword_relevance(&interests, &words(&["economy", "stock markets"]));
        assert!((all - 1.0).abs() < 1e-9);
    }

    #[test]
    fn text_hits_are_case_insensitive() {
        let interests = words(&["AI", "chips", ""]);
        assert_eq!(text_keyword_hits(&interests, "New ai CHIPS unveiled"), 2);
    }

    #[test]
    fn phrase_detection() {
        let phrases = words(&["Mark my words"]);
        assert!(contains_any_phrase("well, mark my words: no", &phrases));
        assert!(!contains_any_phrase("nothing here", &phrases));
        assert!(!contains_any_phrase("anything", &words(&["  "])));
    }

    #[test]
    fn repetition_ratio_counts_overlapping_history() {
        let interests = words(&["crypto", "rates"]);
        let history = words(&["crypto is a fad", "rates will fall", "nice weather"]);
        let ratio = repetition_ratio(&interests, &history, "Crypto rally continues");
        assert!((ratio - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(repetition_ratio(&interests, &[], "crypto"), 0.0);
    }
}

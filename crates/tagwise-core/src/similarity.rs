//! Word-set similarity between short text fragments

use std::collections::HashSet;

/// Jaccard similarity of the lowercase whitespace-separated word sets of `a` and `b`.
///
/// Returns 0.0 when either side has no words. Only whole words match.
pub fn similarity(a: &str, b: &str) -> f64 {
    let words_a = word_set(a);
    let words_b = word_set(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.len() + words_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

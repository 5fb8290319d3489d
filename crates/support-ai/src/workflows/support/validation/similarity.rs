use std::collections::BTreeSet;

/// Case-fold, strip punctuation, and tokenize into a word set.
pub(crate) fn normalize_tokens(raw: &str) -> BTreeSet<String> {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Intersection-over-union of two word sets. Symmetric by construction.
pub(crate) fn token_set_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

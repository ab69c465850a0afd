//! Token-set similarity

use std::collections::HashSet;

use crate::content::tokenize;

/// Distinct lower-cased tokens longer than two characters
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Jaccard overlap of two token sets (0.0 when both are empty)
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard overlap of two texts
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(&token_set(a), &token_set(b))
}

use std::collections::HashSet;

use super::normalize::TextNormalizer;

/// Bounded [0, 1] similarity between two free-text values.
///
/// Both inputs are normalized first, so casing, whitespace and diacritics
/// never affect the score. The final score is the *higher* of a token-set
/// overlap ratio and a normalized edit-distance ratio: "same words, different
/// order" and "same spelling, minor typo" should both register as similar.
pub struct SimilarityScorer;

impl SimilarityScorer {
    /// Symmetric, reflexive for non-empty inputs; two empty strings carry no
    /// signal and score 0.
    pub fn score(a: &str, b: &str) -> f64 {
        let a = TextNormalizer::normalize(a).normalized;
        let b = TextNormalizer::normalize(b).normalized;

        if a.is_empty() && b.is_empty() {
            return 0.0;
        }
        // Exact match on the normalized key short-circuits fuzzy scoring
        if a == b {
            return 1.0;
        }

        Self::token_overlap(&a, &b).max(Self::edit_ratio(&a, &b))
    }

    /// Jaccard overlap over whitespace-split tokens.
    fn token_overlap(a: &str, b: &str) -> f64 {
        let tokens_a: HashSet<&str> = a.split_whitespace().collect();
        let tokens_b: HashSet<&str> = b.split_whitespace().collect();

        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 0.0;
        }

        let intersection = tokens_a.intersection(&tokens_b).count();
        let union = tokens_a.union(&tokens_b).count();
        intersection as f64 / union as f64
    }

    /// `1 - levenshtein / max_len`, on already-normalized strings.
    fn edit_ratio(a: &str, b: &str) -> f64 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 0.0;
        }
        let distance = strsim::levenshtein(a, b);
        1.0 - (distance as f64 / max_len as f64)
    }
}

//! Graded closeness between the word that was spoken and what the learner typed.
//!
//! Scores are `1 - distance / max_len` where distance is the Damerau-Levenshtein
//! edit distance over characters. Both inputs are trimmed and lowercased first.

use crate::word::normalize;
use strsim::normalized_damerau_levenshtein;

/// Similarity in `[0.0, 1.0]` between the expected word and the typed text.
///
/// Two empty strings score 1.0; an empty string against a non-empty one scores 0.0.
pub fn score(expected: &str, typed: &str) -> f64 {
    let expected = normalize(expected);
    let typed = normalize(typed);

    normalized_damerau_levenshtein(&expected, &typed).clamp(0.0, 1.0)
}

/// Case-insensitive equality of the expected word and the typed text.
///
/// Computed independently of [`score`] so callers can display both signals.
pub fn is_exact_match(expected: &str, typed: &str) -> bool {
    normalize(expected) == normalize(typed)
}

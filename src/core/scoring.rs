use crate::core::normalize::normalize;

/// Calculate the similarity (0-1) between a query and a candidate name
///
/// Both strings are normalized first. The score is the normalized
/// Levenshtein similarity counted in characters, not bytes, rounded to two
/// decimals. An empty normalized string on either side scores 0.
pub fn similarity(query: &str, name: &str) -> f64 {
    let query = normalize(query);
    let name = normalize(name);

    if query.is_empty() || name.is_empty() {
        return 0.0;
    }

    round_score(strsim::normalized_levenshtein(&query, &name))
}

/// Round a raw score to two decimals, clamped to [0, 1]
#[inline]
pub fn round_score(raw: f64) -> f64 {
    ((raw * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

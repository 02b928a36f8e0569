use crate::models::{Candidate, ScoredCandidate};
use crate::core::scoring::similarity;
use thiserror::Error;

/// Default minimum similarity for a candidate to be kept
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Errors raised by the matcher for malformed input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Ranks ads-platform candidates against a criterion by textual closeness
///
/// # Pipeline Stages
/// 1. Normalize query and candidate names
/// 2. Score (normalized Levenshtein, rounded to two decimals)
/// 3. Drop scores below the threshold
/// 4. Sort best-first, ties keep input order
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: f64,
}

impl Matcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Rank using the configured threshold
    pub fn rank_default(
        &self,
        query: &str,
        candidates: &[Candidate],
    ) -> Result<Vec<ScoredCandidate>, MatchError> {
        rank(query, candidates, self.threshold)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Rank candidates against a query
///
/// # Arguments
/// * `query` - The criterion text
/// * `candidates` - Interest suggestions to score
/// * `threshold` - Minimum rounded score to keep (inclusive)
///
/// # Returns
/// Candidates at or above the threshold, highest score first. A candidate
/// without a name fails the whole call with `MatchError::InvalidArgument`.
pub fn rank(
    query: &str,
    candidates: &[Candidate],
    threshold: f64,
) -> Result<Vec<ScoredCandidate>, MatchError> {
    let mut scored = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let name = candidate.name.as_deref().ok_or_else(|| {
            MatchError::InvalidArgument(format!("candidate {} has no name", candidate.id))
        })?;

        let score = similarity(query, name);
        if score < threshold {
            continue;
        }

        scored.push(ScoredCandidate {
            id: candidate.id.clone(),
            name: name.to_string(),
            path: candidate.path.clone(),
            audience_size: candidate.audience_size,
            topic: candidate.topic.clone(),
            score,
        });
    }

    // Stable sort keeps input order among equal scores
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(scored)
}

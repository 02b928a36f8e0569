//! Criteria Match - interest matching service for audience research
//!
//! Ranks ads-platform interest suggestions against marketing criteria by
//! string similarity, and runs whole criteria lists as batches that report
//! progress as they go.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Matcher, BatchProcessor, CandidateSource, ProgressSink, rank};
pub use crate::models::{Candidate, ScoredCandidate, BatchItem, ProgressEvent, ProgressStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let matches = rank("Nike", &[Candidate::named("1", "Nike")], 0.3).unwrap();
        assert_eq!(matches[0].score, 1.0);
    }
}

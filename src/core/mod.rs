// Core algorithm exports
pub mod batch;
pub mod matcher;
pub mod normalize;
pub mod scoring;

pub use batch::{BatchProcessor, BatchError, CandidateSource, LookupError, ProgressError, ProgressSink};
pub use matcher::{Matcher, MatchError, rank, DEFAULT_THRESHOLD};
pub use normalize::normalize;
pub use scoring::{similarity, round_score};

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Candidate, ScoredCandidate, BatchItem, ProgressEvent, ProgressStatus, ProgressMessage};
pub use requests::{RankRequest, BatchRequest, ProgressQuery};
pub use responses::{RankResponse, BatchResponse, HealthResponse, ErrorResponse};

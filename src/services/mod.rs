// Service exports
pub mod ads;
pub mod progress;
pub mod retry_queue;

pub use ads::{AdsClient, AdsClientOptions, AdsError};
pub use progress::{ProgressHub, ProgressPublisher};
pub use retry_queue::{RetryQueue, RetryHandle, RetryEntry, RetryOutcome, RetryConfig, zero_audience_entries};

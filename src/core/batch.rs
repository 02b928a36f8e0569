use crate::core::matcher::{rank, MatchError};
use crate::models::{BatchItem, Candidate, ProgressEvent};
use async_trait::async_trait;
use thiserror::Error;
use tracing::Instrument;

/// Failure of a single candidate lookup
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct LookupError(pub String);

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure to deliver a progress notification
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Progress delivery failed: {0}")]
pub struct ProgressError(pub String);

/// Errors that abort a whole batch
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BatchError {
    #[error("Invalid batch argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Source of interest candidates for a criterion
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(
        &self,
        query: &str,
        country_code: &str,
    ) -> Result<Vec<Candidate>, LookupError>;
}

/// Fire-and-forget receiver of progress events
///
/// Implementations must return quickly; an `Err` aborts the batch.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent) -> Result<(), ProgressError>;
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) -> Result<(), ProgressError> + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) -> Result<(), ProgressError> {
        self(event)
    }
}

/// Drives the matcher across an ordered list of criteria
///
/// Items run one at a time in input order; a failed lookup is recorded on
/// its `BatchItem` and the batch moves on.
#[derive(Debug, Clone, Copy)]
pub struct BatchProcessor {
    max_batch_size: usize,
}

impl BatchProcessor {
    pub fn new(max_batch_size: usize) -> Self {
        Self { max_batch_size }
    }

    /// Run a batch and return one `BatchItem` per query, in input order
    ///
    /// # Arguments
    /// * `batch_id` - Identifier used for the tracing span
    /// * `queries` - Criteria to match
    /// * `country_code` - Passed through to the candidate source
    /// * `threshold` - Minimum similarity score to keep a candidate
    /// * `source` - Candidate lookup
    /// * `sink` - Progress listener
    ///
    /// # Errors
    /// Invalid arguments or a failing progress sink abort the batch. A
    /// `global-error` event is emitted first on a best-effort basis.
    pub async fn run_batch<S, P>(
        &self,
        batch_id: &str,
        queries: &[String],
        country_code: &str,
        threshold: f64,
        source: &S,
        sink: &P,
    ) -> Result<Vec<BatchItem>, BatchError>
    where
        S: CandidateSource + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let span = tracing::info_span!("batch", batch_id = %batch_id, total = queries.len());
        let mut processed = 0;

        let outcome = async {
            self.validate(queries, country_code, threshold)?;
            run_items(queries, country_code, threshold, source, sink, &mut processed).await
        }
        .instrument(span)
        .await;

        if let Err(e) = &outcome {
            tracing::error!("Batch {} failed after {} items: {}", batch_id, processed, e);
            let _ = sink.emit(ProgressEvent::global_error(queries.len(), processed, &e.to_string()));
        }

        outcome
    }

    fn validate(&self, queries: &[String], country_code: &str, threshold: f64) -> Result<(), BatchError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(BatchError::InvalidArgument(format!(
                "threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if country_code.trim().is_empty() {
            return Err(BatchError::InvalidArgument("country code is required".into()));
        }
        if queries.len() > self.max_batch_size {
            return Err(BatchError::InvalidArgument(format!(
                "batch of {} queries exceeds the limit of {}",
                queries.len(),
                self.max_batch_size
            )));
        }
        Ok(())
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(500)
    }
}

async fn run_items<S, P>(
    queries: &[String],
    country_code: &str,
    threshold: f64,
    source: &S,
    sink: &P,
    processed: &mut usize,
) -> Result<Vec<BatchItem>, BatchError>
where
    S: CandidateSource + ?Sized,
    P: ProgressSink + ?Sized,
{
    let total = queries.len();
    let mut items = Vec::with_capacity(total);

    sink.emit(ProgressEvent::starting(total))?;
    tracing::info!("Starting batch of {} criteria for {}", total, country_code);

    for (i, query) in queries.iter().enumerate() {
        sink.emit(ProgressEvent::processing(total, i, query))?;

        match match_one(query, country_code, threshold, source).await {
            Ok(matches) => {
                tracing::debug!("{} -> {} matches", query, matches.len());
                let match_count = matches.len();
                items.push(BatchItem::matched(query.as_str(), matches));
                *processed = i + 1;
                sink.emit(ProgressEvent::completed(total, i, query, match_count))?;
            }
            Err(message) => {
                tracing::warn!("Lookup for {} failed: {}", query, message);
                items.push(BatchItem::failed(query.as_str(), message.as_str()));
                *processed = i + 1;
                sink.emit(ProgressEvent::item_error(total, i, query, &message))?;
            }
        }
    }

    sink.emit(ProgressEvent::finished(total))?;
    tracing::info!("Finished batch of {} criteria", total);

    Ok(items)
}

async fn match_one<S>(
    query: &str,
    country_code: &str,
    threshold: f64,
    source: &S,
) -> Result<Vec<crate::models::ScoredCandidate>, String>
where
    S: CandidateSource + ?Sized,
{
    let candidates = source
        .fetch_candidates(query, country_code)
        .await
        .map_err(|e| e.to_string())?;

    rank(query, &candidates, threshold).map_err(|e: MatchError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgressStatus;
    use std::sync::Mutex;

    struct FixedSource;

    #[async_trait]
    impl CandidateSource for FixedSource {
        async fn fetch_candidates(&self, query: &str, _country_code: &str) -> Result<Vec<Candidate>, LookupError> {
            if query == "boom" {
                return Err(LookupError::new("upstream unavailable"));
            }
            Ok(vec![Candidate::named("1", format!("{} Inc.", query))])
        }
    }

    #[derive(Default)]
    struct Collector(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for Collector {
        fn emit(&self, event: ProgressEvent) -> Result<(), ProgressError> {
            self.0.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_single_item_batch() {
        let sink = Collector::default();
        let items = BatchProcessor::default()
            .run_batch("t", &queries(&["Nike"]), "US", 0.3, &FixedSource, &sink)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original, "Nike");
        assert_eq!(items[0].matches[0].score, 0.5);
        assert!(items[0].error.is_none());

        let statuses: Vec<ProgressStatus> = sink.0.lock().unwrap().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                ProgressStatus::Starting,
                ProgressStatus::Processing,
                ProgressStatus::Completed,
                ProgressStatus::Finished,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_item_does_not_abort() {
        let sink = Collector::default();
        let items = BatchProcessor::default()
            .run_batch("t", &queries(&["a", "boom", "c"]), "US", 0.3, &FixedSource, &sink)
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[1].error.as_deref(), Some("upstream unavailable"));
        assert!(items[1].matches.is_empty());

        let events = sink.0.lock().unwrap();
        let error_event = events.iter().find(|e| e.status == ProgressStatus::Error).unwrap();
        assert_eq!(error_event.current, 2);
        assert_eq!(error_event.current_item.as_deref(), Some("boom"));
        assert_eq!(error_event.error.as_deref(), Some("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_invalid_threshold_is_global_error() {
        let sink = Collector::default();
        let err = BatchProcessor::default()
            .run_batch("t", &queries(&["Nike"]), "US", 1.5, &FixedSource, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::InvalidArgument(_)));
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ProgressStatus::GlobalError);
    }

    #[tokio::test]
    async fn test_batch_size_limit() {
        let sink = Collector::default();
        let err = BatchProcessor::new(2)
            .run_batch("t", &queries(&["a", "b", "c"]), "US", 0.3, &FixedSource, &sink)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exceeds the limit of 2"));
    }
}

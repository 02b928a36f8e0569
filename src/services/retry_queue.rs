use crate::core::CandidateSource;
use crate::models::BatchItem;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Matched interest whose audience came back as zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryEntry {
    pub query: String,
    pub country_code: String,
    pub interest_id: String,
    pub attempts: u32,
}

impl RetryEntry {
    pub fn new(query: impl Into<String>, country_code: impl Into<String>, interest_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            country_code: country_code.into(),
            interest_id: interest_id.into(),
            attempts: 0,
        }
    }
}

/// Result of re-checking one entry
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    Resolved { entry: RetryEntry, audience_size: u64 },
    Abandoned { entry: RetryEntry },
}

/// Shortest pause between retry passes; a zero interval would panic the timer
pub const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub capacity: usize,
}

/// Collect every matched interest with a known audience of zero
pub fn zero_audience_entries(items: &[BatchItem], country_code: &str) -> Vec<RetryEntry> {
    items
        .iter()
        .flat_map(|item| {
            item.matches
                .iter()
                .filter(|m| m.audience_size == Some(0))
                .map(move |m| RetryEntry::new(item.original.as_str(), country_code, m.id.as_str()))
        })
        .collect()
}

/// Sending side of the retry queue, safe to share across requests
#[derive(Clone)]
pub struct RetryHandle {
    tx: mpsc::Sender<RetryEntry>,
}

impl RetryHandle {
    /// Hand an entry to the queue without waiting
    ///
    /// Returns false if the entry was dropped because the channel is full
    /// or the worker has stopped.
    pub fn enqueue(&self, entry: RetryEntry) -> bool {
        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(entry)) => {
                tracing::warn!("Retry channel full, dropping {} ({})", entry.interest_id, entry.query);
                false
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                tracing::warn!("Retry worker stopped, dropping {} ({})", entry.interest_id, entry.query);
                false
            }
        }
    }
}

/// Bounded queue of zero-audience lookups, owned by a single background task
pub struct RetryQueue {
    source: Arc<dyn CandidateSource>,
    pending: VecDeque<RetryEntry>,
    config: RetryConfig,
    outcomes: Option<mpsc::UnboundedSender<RetryOutcome>>,
}

impl RetryQueue {
    pub fn new(source: Arc<dyn CandidateSource>, config: RetryConfig) -> Self {
        Self {
            source,
            pending: VecDeque::with_capacity(config.capacity),
            config,
            outcomes: None,
        }
    }

    /// Report resolved and abandoned entries on `tx`
    pub fn with_outcomes(mut self, tx: mpsc::UnboundedSender<RetryOutcome>) -> Self {
        self.outcomes = Some(tx);
        self
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Add an entry, evicting the oldest one when full
    pub fn push(&mut self, entry: RetryEntry) {
        if self.config.capacity == 0 {
            return;
        }
        if self.pending.len() >= self.config.capacity {
            if let Some(evicted) = self.pending.pop_front() {
                tracing::warn!("Retry queue full, evicting {} ({})", evicted.interest_id, evicted.query);
            }
        }
        self.pending.push_back(entry);
    }

    /// Re-check every entry that was queued when the pass started
    ///
    /// Returns the number of entries resolved in this pass.
    pub async fn process_due(&mut self) -> usize {
        let due = self.pending.len();
        let mut resolved = 0;

        for _ in 0..due {
            let Some(mut entry) = self.pending.pop_front() else {
                break;
            };

            let audience = match self
                .source
                .fetch_candidates(&entry.query, &entry.country_code)
                .await
            {
                Ok(candidates) => candidates
                    .into_iter()
                    .find(|c| c.id == entry.interest_id)
                    .and_then(|c| c.audience_size)
                    .filter(|size| *size > 0),
                Err(e) => {
                    tracing::debug!("Retry lookup for {} failed: {}", entry.query, e);
                    None
                }
            };

            entry.attempts += 1;

            match audience {
                Some(audience_size) => {
                    tracing::info!(
                        "Interest {} for {} now has audience {} after {} attempts",
                        entry.interest_id, entry.query, audience_size, entry.attempts
                    );
                    resolved += 1;
                    self.report(RetryOutcome::Resolved { entry, audience_size });
                }
                None if entry.attempts >= self.config.max_attempts => {
                    tracing::info!(
                        "Giving up on interest {} for {} after {} attempts",
                        entry.interest_id, entry.query, entry.attempts
                    );
                    self.report(RetryOutcome::Abandoned { entry });
                }
                None => self.pending.push_back(entry),
            }
        }

        resolved
    }

    fn report(&self, outcome: RetryOutcome) {
        if let Some(tx) = &self.outcomes {
            let _ = tx.send(outcome);
        }
    }

    /// Move the queue onto its own task and return the handle used to feed it
    ///
    /// The task stops once every `RetryHandle` has been dropped.
    pub fn spawn(mut self) -> (RetryHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(self.config.capacity.max(1));
        let interval = self.config.interval.max(MIN_RETRY_INTERVAL);
        if interval != self.config.interval {
            tracing::warn!("Retry interval {:?} raised to {:?}", self.config.interval, interval);
        }

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(entry) => self.push(entry),
                        None => break,
                    },
                    _ = ticker.tick() => {
                        if !self.is_empty() {
                            let resolved = self.process_due().await;
                            tracing::debug!("Retry pass resolved {}, {} still pending", resolved, self.len());
                        }
                    }
                }
            }

            tracing::info!("Retry queue stopped with {} pending entries", self.len());
        });

        (RetryHandle { tx }, task)
    }
}

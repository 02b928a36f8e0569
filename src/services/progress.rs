use crate::core::{ProgressError, ProgressSink};
use crate::models::{ProgressEvent, ProgressMessage};
use tokio::sync::broadcast;

/// Broadcast hub for batch progress
///
/// Delivery is best-effort: sending with nobody listening is fine and
/// late subscribers only see events published after they joined.
#[derive(Clone)]
pub struct ProgressHub {
    tx: broadcast::Sender<ProgressMessage>,
}

impl ProgressHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe a new listener
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressMessage> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Sink that tags every event with `batch_id`
    pub fn publisher(&self, batch_id: impl Into<String>) -> ProgressPublisher {
        ProgressPublisher {
            batch_id: batch_id.into(),
            tx: self.tx.clone(),
        }
    }
}

/// Progress sink bound to one batch
pub struct ProgressPublisher {
    batch_id: String,
    tx: broadcast::Sender<ProgressMessage>,
}

impl ProgressSink for ProgressPublisher {
    fn emit(&self, event: ProgressEvent) -> Result<(), ProgressError> {
        let message = ProgressMessage {
            batch_id: self.batch_id.clone(),
            event,
        };

        match self.tx.send(message) {
            Ok(receivers) => tracing::trace!("Progress for {} sent to {} receivers", self.batch_id, receivers),
            // No receivers - progress is advisory
            Err(_) => tracing::trace!("No progress listeners for {}", self.batch_id),
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

/// Interest suggestion returned by the ads platform for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<Vec<String>>,
    #[serde(rename = "audienceSize", default)]
    pub audience_size: Option<u64>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl Candidate {
    /// Build a candidate with just an id and a display name
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            path: None,
            audience_size: None,
            topic: None,
        }
    }

    pub fn with_audience_size(mut self, audience_size: u64) -> Self {
        self.audience_size = Some(audience_size);
        self
    }
}

/// Candidate that passed the similarity threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub name: String,
    pub path: Option<Vec<String>>,
    #[serde(rename = "audienceSize")]
    pub audience_size: Option<u64>,
    pub topic: Option<String>,
    /// Similarity in [0, 1], rounded to two decimals
    pub score: f64,
}

/// Outcome for one query of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub original: String,
    pub matches: Vec<ScoredCandidate>,
    pub error: Option<String>,
}

impl BatchItem {
    pub fn matched(original: impl Into<String>, matches: Vec<ScoredCandidate>) -> Self {
        Self {
            original: original.into(),
            matches,
            error: None,
        }
    }

    pub fn failed(original: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            matches: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    Starting,
    Processing,
    Completed,
    Error,
    Finished,
    GlobalError,
}

/// Advisory notification describing where a batch is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub total: usize,
    pub current: usize,
    #[serde(rename = "currentItem")]
    pub current_item: Option<String>,
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(rename = "matchCount", skip_serializing_if = "Option::is_none", default)]
    pub match_count: Option<usize>,
}

impl ProgressEvent {
    pub fn starting(total: usize) -> Self {
        Self::bare(total, 0, None, ProgressStatus::Starting)
    }

    pub fn processing(total: usize, index: usize, query: &str) -> Self {
        Self::bare(total, index, Some(query.to_string()), ProgressStatus::Processing)
    }

    pub fn completed(total: usize, index: usize, query: &str, match_count: usize) -> Self {
        Self {
            match_count: Some(match_count),
            ..Self::bare(total, index + 1, Some(query.to_string()), ProgressStatus::Completed)
        }
    }

    pub fn item_error(total: usize, index: usize, query: &str, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::bare(total, index + 1, Some(query.to_string()), ProgressStatus::Error)
        }
    }

    pub fn finished(total: usize) -> Self {
        Self::bare(total, total, None, ProgressStatus::Finished)
    }

    pub fn global_error(total: usize, current: usize, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::bare(total, current, None, ProgressStatus::GlobalError)
        }
    }

    fn bare(total: usize, current: usize, current_item: Option<String>, status: ProgressStatus) -> Self {
        Self {
            total,
            current,
            current_item,
            status,
            error: None,
            match_count: None,
        }
    }
}

/// Progress event tagged with the batch it belongs to, as sent to listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMessage {
    #[serde(rename = "batchId")]
    pub batch_id: String,
    #[serde(flatten)]
    pub event: ProgressEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_status_tags() {
        let json = serde_json::to_string(&ProgressStatus::GlobalError).unwrap();
        assert_eq!(json, "\"global-error\"");

        let json = serde_json::to_string(&ProgressStatus::Starting).unwrap();
        assert_eq!(json, "\"starting\"");
    }

    #[test]
    fn test_progress_message_is_flattened() {
        let message = ProgressMessage {
            batch_id: "b1".to_string(),
            event: ProgressEvent::completed(3, 0, "Nike", 2),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["batchId"], "b1");
        assert_eq!(value["current"], 1);
        assert_eq!(value["currentItem"], "Nike");
        assert_eq!(value["matchCount"], 2);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_candidate_defaults_optional_fields() {
        let candidate: Candidate = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(candidate.id, "42");
        assert!(candidate.name.is_none());
        assert!(candidate.audience_size.is_none());
    }
}

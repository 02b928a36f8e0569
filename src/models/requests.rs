use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::Candidate;

/// Request to rank a caller-supplied candidate list against one query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankRequest {
    pub query: String,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: Option<f64>,
}

/// Request to run a matching batch over a criteria list
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchRequest {
    #[validate(length(min = 1))]
    pub queries: Vec<String>,
    #[validate(length(min = 2, max = 2))]
    #[serde(alias = "country_code", rename = "countryCode")]
    pub country_code: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: Option<f64>,
    /// Lets a client subscribe to progress before the batch starts
    #[validate(length(min = 1, max = 64))]
    #[serde(alias = "batch_id", rename = "batchId")]
    pub batch_id: Option<String>,
}

/// Query string for the progress stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressQuery {
    #[serde(alias = "batch_id", rename = "batchId")]
    pub batch_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_validation() {
        let req: BatchRequest = serde_json::from_str(
            r#"{"queries": ["Nike"], "countryCode": "US"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());

        let req: BatchRequest = serde_json::from_str(
            r#"{"queries": [], "countryCode": "USA", "threshold": 1.5}"#,
        )
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("queries"));
        assert!(fields.contains_key("country_code"));
        assert!(fields.contains_key("threshold"));
    }
}

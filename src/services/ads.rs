use crate::core::{CandidateSource, LookupError};
use crate::models::Candidate;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the ads platform
#[derive(Debug, Error)]
pub enum AdsError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid or expired access token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<AdsError> for LookupError {
    fn from(err: AdsError) -> Self {
        LookupError::new(err.to_string())
    }
}

/// Connection settings for the ads platform targeting search
#[derive(Debug, Clone)]
pub struct AdsClientOptions {
    pub base_url: String,
    pub api_version: String,
    pub access_token: String,
    pub locale: String,
    pub result_limit: u32,
    pub timeout: Duration,
}

/// Ads platform API client
///
/// Looks up interest suggestions in the targeting taxonomy for a
/// criterion and a country.
pub struct AdsClient {
    base_url: String,
    api_version: String,
    access_token: String,
    locale: String,
    result_limit: u32,
    client: Client,
}

/// Raw interest entry as returned by the search endpoint
#[derive(Debug, Deserialize)]
struct InterestEntry {
    id: Value,
    name: Option<String>,
    #[serde(default)]
    path: Option<Vec<String>>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    audience_size: Option<u64>,
    #[serde(default)]
    audience_size_lower_bound: Option<u64>,
    #[serde(default)]
    audience_size_upper_bound: Option<u64>,
}

impl InterestEntry {
    fn into_candidate(self) -> Option<Candidate> {
        // Ids come back as strings or numbers depending on API version
        let id = match self.id {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(Candidate {
            id,
            name: self.name,
            path: self.path,
            audience_size: self
                .audience_size_upper_bound
                .or(self.audience_size_lower_bound)
                .or(self.audience_size),
            topic: self.topic,
        })
    }
}

impl AdsClient {
    /// Create a new ads platform client
    pub fn new(options: AdsClientOptions) -> Result<Self, AdsError> {
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            base_url: options.base_url,
            api_version: options.api_version,
            access_token: options.access_token,
            locale: options.locale,
            result_limit: options.result_limit,
            client,
        })
    }

    /// Search the interest taxonomy for a criterion
    pub async fn search_interests(
        &self,
        query: &str,
        country_code: &str,
    ) -> Result<Vec<Candidate>, AdsError> {
        let url = format!(
            "{}/{}/search?type=adinterest&q={}&limit={}&locale={}&country_code={}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            urlencoding::encode(query),
            self.result_limit,
            urlencoding::encode(&self.locale),
            urlencoding::encode(country_code),
        );

        tracing::debug!("Searching interests for {:?} in {}", query, country_code);

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdsError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| status.to_string());
            tracing::error!("Interest search for {:?} failed: {} - {}", query, status, message);
            return Err(AdsError::ApiError(format!(
                "Interest search failed ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let json: Value = response.json().await?;

        let data = json
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AdsError::InvalidResponse("Missing data array".into()))?;

        let candidates: Vec<Candidate> = data
            .iter()
            .filter_map(|entry| {
                serde_json::from_value::<InterestEntry>(entry.clone())
                    .ok()
                    .and_then(InterestEntry::into_candidate)
            })
            .collect();

        tracing::debug!("Found {} interests for {:?}", candidates.len(), query);

        Ok(candidates)
    }
}

#[async_trait]
impl CandidateSource for AdsClient {
    async fn fetch_candidates(
        &self,
        query: &str,
        country_code: &str,
    ) -> Result<Vec<Candidate>, LookupError> {
        Ok(self.search_interests(query, country_code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> AdsClientOptions {
        AdsClientOptions {
            base_url: "https://graph.test/".to_string(),
            api_version: "v19.0".to_string(),
            access_token: "test_token".to_string(),
            locale: "en_US".to_string(),
            result_limit: 25,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_ads_client_creation() {
        let client = AdsClient::new(options()).unwrap();

        assert_eq!(client.base_url, "https://graph.test/");
        assert_eq!(client.access_token, "test_token");
        assert_eq!(client.result_limit, 25);
    }

    #[test]
    fn test_interest_entry_mapping() {
        let entry: InterestEntry = serde_json::from_value(serde_json::json!({
            "id": 6003107902433u64,
            "name": "Association football",
            "path": ["Interests", "Sports"],
            "audience_size_lower_bound": 100,
            "audience_size_upper_bound": 200
        }))
        .unwrap();

        let candidate = entry.into_candidate().unwrap();
        assert_eq!(candidate.id, "6003107902433");
        assert_eq!(candidate.audience_size, Some(200));
        assert_eq!(candidate.path.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_unknown_audience_stays_none() {
        let entry: InterestEntry =
            serde_json::from_value(serde_json::json!({"id": "1", "name": "Nike"})).unwrap();
        assert_eq!(entry.into_candidate().unwrap().audience_size, None);
    }

    #[test]
    fn test_ads_error_converts_to_lookup_error() {
        let err: LookupError = AdsError::Unauthorized.into();
        assert_eq!(err.0, "Unauthorized: invalid or expired access token");
    }
}

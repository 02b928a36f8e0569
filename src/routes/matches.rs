use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{rank, BatchError, BatchProcessor, CandidateSource, MatchError, Matcher};
use crate::models::{BatchRequest, BatchResponse, ErrorResponse, HealthResponse, RankRequest, RankResponse};
use crate::services::{zero_audience_entries, ProgressHub, RetryHandle};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub ads: Arc<dyn CandidateSource>,
    pub progress: ProgressHub,
    pub retry: Option<RetryHandle>,
    pub matcher: Matcher,
    pub processor: BatchProcessor,
    pub keep_alive: Duration,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/rank", web::post().to(rank_candidates))
        .route("/matches/batch", web::post().to(run_batch));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

/// Rank caller-supplied candidates
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// {
///   "query": "string",
///   "candidates": [{"id": "string", "name": "string"}],
///   "threshold": 0.3
/// }
/// ```
async fn rank_candidates(
    state: web::Data<AppState>,
    req: web::Json<RankRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let threshold = req.threshold.unwrap_or(state.matcher.threshold());

    match rank(&req.query, &req.candidates, threshold) {
        Ok(matches) => {
            tracing::debug!("Ranked {} of {} candidates for {:?}", matches.len(), req.candidates.len(), req.query);
            HttpResponse::Ok().json(RankResponse { matches })
        }
        Err(e @ MatchError::InvalidArgument(_)) => {
            tracing::info!("Rejected rank request: {}", e);
            bad_request("Invalid candidates", e.to_string())
        }
    }
}

/// Run a matching batch
///
/// POST /api/v1/matches/batch
///
/// Request body:
/// ```json
/// {
///   "queries": ["string"],
///   "countryCode": "US",
///   "threshold": 0.3,
///   "batchId": "string"
/// }
/// ```
///
/// Progress for the batch is published on `/api/v1/progress`. Lookup
/// failures for individual criteria are returned inside `results`.
async fn run_batch(
    state: web::Data<AppState>,
    req: web::Json<BatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for batch request: field_errors={:?}", errors);
        return bad_request("Validation failed", errors.to_string());
    }

    let req = req.into_inner();
    let batch_id = req
        .batch_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let threshold = req.threshold.unwrap_or(state.matcher.threshold());

    tracing::info!(
        "Running batch {} with {} criteria for {}",
        batch_id,
        req.queries.len(),
        req.country_code
    );

    let publisher = state.progress.publisher(batch_id.clone());
    let outcome = state
        .processor
        .run_batch(
            &batch_id,
            &req.queries,
            &req.country_code,
            threshold,
            state.ads.as_ref(),
            &publisher,
        )
        .await;

    match outcome {
        Ok(results) => {
            if let Some(retry) = &state.retry {
                let entries = zero_audience_entries(&results, &req.country_code);
                let queued = entries.into_iter().filter(|e| retry.enqueue(e.clone())).count();
                if queued > 0 {
                    tracing::debug!("Queued {} zero-audience interests for re-check", queued);
                }
            }

            let failed = results.iter().filter(|r| r.error.is_some()).count();
            tracing::info!(
                "Batch {} finished: {} criteria, {} failed lookups",
                batch_id,
                results.len(),
                failed
            );

            HttpResponse::Ok().json(BatchResponse { batch_id, results })
        }
        Err(BatchError::InvalidArgument(message)) => bad_request("Invalid batch", message),
        Err(e) => {
            tracing::error!("Batch {} aborted: {}", batch_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Batch failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

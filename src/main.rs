use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use criteria_match::config::Settings;
use criteria_match::core::{BatchProcessor, CandidateSource, Matcher};
use criteria_match::routes::{self, AppState};
use criteria_match::services::{AdsClient, AdsClientOptions, ProgressHub, RetryConfig, RetryOutcome, RetryQueue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Criteria Match service...");

    if settings.ads.access_token.is_empty() {
        error!("No ads access token configured, interest lookups will be rejected upstream");
    }

    let ads = AdsClient::new(AdsClientOptions {
        base_url: settings.ads.base_url.clone(),
        api_version: settings.ads.api_version.clone(),
        access_token: settings.ads.access_token.clone(),
        locale: settings.ads.locale.clone(),
        result_limit: settings.ads.result_limit,
        timeout: Duration::from_secs(settings.ads.timeout_secs),
    })
    .map_err(|e| {
        error!("Failed to create ads client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let ads: Arc<dyn CandidateSource> = Arc::new(ads);

    info!("Ads client initialized ({} {})", settings.ads.base_url, settings.ads.api_version);

    let retry = if settings.retry.enabled {
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let queue = RetryQueue::new(
            ads.clone(),
            RetryConfig {
                interval: Duration::from_secs(settings.retry.interval_secs.max(1)),
                max_attempts: settings.retry.max_attempts,
                capacity: settings.retry.capacity,
            },
        )
        .with_outcomes(outcome_tx);
        let (handle, task) = queue.spawn();

        tokio::spawn(async move {
            if let Err(e) = task.await {
                error!("Retry queue task failed: {}", e);
            }
        });

        tokio::spawn(async move {
            while let Some(outcome) = outcome_rx.recv().await {
                match outcome {
                    RetryOutcome::Resolved { entry, audience_size } => info!(
                        "Zero-audience interest {} for {:?} resolved to {}",
                        entry.interest_id, entry.query, audience_size
                    ),
                    RetryOutcome::Abandoned { entry } => info!(
                        "Zero-audience interest {} for {:?} abandoned",
                        entry.interest_id, entry.query
                    ),
                }
            }
        });

        info!(
            "Retry queue running every {}s (max {} attempts)",
            settings.retry.interval_secs.max(1), settings.retry.max_attempts
        );
        Some(handle)
    } else {
        None
    };

    let matcher = Matcher::new(settings.matching.threshold);

    info!("Matcher initialized with threshold {}", matcher.threshold());

    let app_state = AppState {
        ads,
        progress: ProgressHub::new(settings.progress.channel_capacity),
        retry,
        matcher,
        processor: BatchProcessor::new(settings.matching.max_batch_size),
        keep_alive: Duration::from_secs(settings.progress.keep_alive_secs.max(1)),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

use actix_web::{web, HttpResponse, Responder};
use futures::stream::{self, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use crate::models::{ProgressMessage, ProgressQuery};
use crate::routes::matches::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/progress", web::get().to(progress_stream));
}

/// Format one progress message as an SSE frame
pub fn sse_frame(message: &ProgressMessage) -> Result<web::Bytes, serde_json::Error> {
    let json = serde_json::to_string(message)?;
    Ok(web::Bytes::from(format!("event: progress\ndata: {}\n\n", json)))
}

/// Progress event stream
///
/// GET /api/v1/progress?batchId={batchId}
///
/// Server-Sent Events carrying every progress message published after the
/// client connects, optionally restricted to one batch.
async fn progress_stream(
    state: web::Data<AppState>,
    query: web::Query<ProgressQuery>,
) -> impl Responder {
    let filter = query.into_inner().batch_id;
    tracing::debug!("Progress listener connected (batch filter: {:?})", filter);

    let events = BroadcastStream::new(state.progress.subscribe()).filter_map(move |result| {
        let frame = match result {
            Ok(message) if filter.as_deref().is_some_and(|id| id != message.batch_id) => None,
            Ok(message) => match sse_frame(&message) {
                Ok(bytes) => Some(Ok::<_, Infallible>(bytes)),
                Err(e) => {
                    tracing::warn!("Failed to serialize progress message: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged listener, skip what was dropped
                tracing::warn!("Progress stream error: {}", e);
                None
            }
        };
        async move { frame }
    });

    let period = state.keep_alive.max(Duration::from_millis(1));
    let keep_alive = IntervalStream::new(tokio::time::interval(period))
        .map(|_| Ok::<_, Infallible>(web::Bytes::from_static(b": keep-alive\n\n")));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream::select(events, keep_alive))
}

use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ApiError;
use crate::metrics::{GENERATION_LATENCY, PREDICT_LATENCY, PREDICT_TOTAL};
use crate::models::{PredictRequest, PredictResponse};
use crate::prompt::{build_prompt, extract_answer};
use crate::state::AppState;

// Answers one FAQ question. No retries or caching here, callers own those.
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    request: Result<PredictRequest, ApiError>,
) -> Result<Json<PredictResponse>, ApiError> {
    PREDICT_TOTAL.inc();
    // observes on drop, so failed requests are timed too
    let _latency = PREDICT_LATENCY.start_timer();
    let start_time = Instant::now();

    let request = request?;
    if !state.generator.is_ready() {
        return Err(ApiError::ModelUnavailable);
    }

    let prompt = build_prompt(&request.question);
    tracing::debug!(params = ?request.params, "Generating answer");

    let generation_start = Instant::now();
    let completion = state.generator.generate(&prompt, &request.params).await?;
    GENERATION_LATENCY.observe(generation_start.elapsed().as_secs_f64());

    let answer = extract_answer(&completion);
    tracing::info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        answer_chars = answer.chars().count(),
        "Answered question"
    );

    Ok(Json(PredictResponse { answer }))
}

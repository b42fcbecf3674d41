use axum::{Json, extract::State};
use std::sync::Arc;

use crate::models::HealthResponse;
use crate::state::AppState;

// health handler, always 200 so orchestrators can read the body
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = state.generator.is_ready();
    Json(HealthResponse {
        status: if loaded { "healthy" } else { "model_not_loaded" }.to_string(),
        model_loaded: loaded,
        model: state.generator.model_name().to_string(),
        runtime: state.generator.endpoint().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

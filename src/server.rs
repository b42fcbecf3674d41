use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::error::INTERNAL_ERROR_DETAIL;
use crate::handlers::{health_handler, info_handler, metrics_handler, predict_handler};
use crate::metrics::PREDICT_FAILURES;
use crate::models::ErrorBody;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(info_handler))
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// A panicking request gets the same 500 body as a failed generation
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = message, "Request handler panicked");
    PREDICT_FAILURES.with_label_values(&["internal"]).inc();

    let body = ErrorBody {
        detail: INTERNAL_ERROR_DETAIL.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

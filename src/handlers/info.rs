use axum::{Json, response::IntoResponse};

// Describes the service and how to call it
pub async fn info_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Education FAQ answer service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Answers student questions with a fine-tuned Gemma model",
        "endpoints": {
            "health": "GET /health - service and model status",
            "predict": "POST /predict - answer a question",
            "metrics": "GET /metrics - Prometheus metrics"
        },
        "usage": {
            "example": {
                "method": "POST",
                "url": "/predict",
                "body": {
                    "question": "오답노트는 어떻게 정리할까요?"
                }
            }
        }
    }))
}

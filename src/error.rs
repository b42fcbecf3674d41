//! Error types for the answer service.
//!
//! Request-level failures are collected in [`ApiError`], which renders every
//! variant as a JSON `{"detail": ...}` body with the matching status code.
//! Runtime failures are logged here and never leak into the response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::metrics::PREDICT_FAILURES;
use crate::models::ErrorBody;

pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";
pub const MODEL_NOT_LOADED_DETAIL: &str = "Model is not loaded";

/// A request body that cannot be turned into a `PredictRequest`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Field required: {0}")]
    MissingField(&'static str),

    #[error("Invalid type for {field}: expected {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Value out of range for {field}: {constraint}")]
    OutOfRange {
        field: &'static str,
        constraint: &'static str,
    },
}

impl ValidationError {
    /// The request field this error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(field)
            | ValidationError::InvalidType { field, .. }
            | ValidationError::OutOfRange { field, .. } => Some(field),
            ValidationError::MalformedBody(_) | ValidationError::NotAnObject => None,
        }
    }
}

/// Failures talking to the model runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("runtime returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("model {0} is not available in the runtime")]
    ModelMissing(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("model is not loaded")]
    ModelUnavailable,

    #[error("generation failed: {0}")]
    Generation(#[from] RuntimeError),

    // body could not be read at all, e.g. over the size limit
    #[error("{detail}")]
    Body { status: StatusCode, detail: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body { status, .. } => *status,
        }
    }

    // Label used for the failure counter
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::ModelUnavailable => "unavailable",
            ApiError::Generation(_) => "internal",
            ApiError::Body { .. } => "body",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Validation(err) => err.to_string(),
            ApiError::ModelUnavailable => MODEL_NOT_LOADED_DETAIL.to_string(),
            ApiError::Generation(_) => INTERNAL_ERROR_DETAIL.to_string(),
            ApiError::Body { detail, .. } => detail.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        PREDICT_FAILURES.with_label_values(&[self.kind()]).inc();

        match &self {
            ApiError::Validation(err) => {
                tracing::info!(field = err.field(), error = %err, "Rejected request");
            }
            ApiError::ModelUnavailable => {
                tracing::warn!("Request received while the model is not loaded");
            }
            ApiError::Generation(err) => {
                tracing::error!(error = %err, "Generation failed");
            }
            ApiError::Body { status, detail } => {
                tracing::info!(status = status.as_u16(), error = %detail, "Unreadable request body");
            }
        }

        let body = ErrorBody {
            detail: self.detail(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Errors that stop the process before it starts serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build the runtime client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to load model: {0}")]
    ModelLoad(#[source] RuntimeError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        assert_eq!(
            ValidationError::MissingField("question").to_string(),
            "Field required: question"
        );
        let err = ValidationError::InvalidType {
            field: "max_tokens",
            expected: "an integer",
        };
        assert_eq!(err.to_string(), "Invalid type for max_tokens: expected an integer");
        assert_eq!(err.field(), Some("max_tokens"));
        assert_eq!(ValidationError::NotAnObject.field(), None);
    }

    #[test]
    fn status_codes_follow_the_error_kind() {
        let validation = ApiError::from(ValidationError::MissingField("question"));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ModelUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let generation = ApiError::from(RuntimeError::Backend {
            status: 500,
            message: "out of memory".to_string(),
        });
        assert_eq!(generation.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generation_detail_hides_the_cause() {
        let err = ApiError::from(RuntimeError::Backend {
            status: 500,
            message: "CUDA out of memory at /opt/weights".to_string(),
        });
        assert_eq!(err.detail(), INTERNAL_ERROR_DETAIL);
    }

    #[tokio::test]
    async fn into_response_renders_detail_body() -> Result<(), String> {
        let response = ApiError::from(ValidationError::MissingField("question")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        let body: ErrorBody = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
        assert_eq!(body.detail, "Field required: question");
        Ok(())
    }
}

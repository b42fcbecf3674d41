//! Turns a raw `/predict` body into a [`PredictRequest`].
//!
//! Fields are coerced one at a time so a failure can name the field that
//! caused it. Numbers sent as strings (`"80"`, `"0.5"`) are accepted, absent
//! and `null` optional fields fall back to their defaults.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::{Map, Value};

use crate::error::{ApiError, ValidationError};
use crate::models::{GenerationParams, PredictRequest};

impl PredictRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let fields = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let defaults = GenerationParams::default();

        let question = required_text(fields, "question")?;

        let max_tokens = optional_int(fields, "max_tokens")?.unwrap_or(defaults.max_tokens as u64);
        if max_tokens < 1 {
            return Err(out_of_range("max_tokens", "must be >= 1"));
        }
        let max_tokens = u32::try_from(max_tokens)
            .map_err(|_| out_of_range("max_tokens", "must fit in 32 bits"))?;

        let temperature = optional_float(fields, "temperature")?.unwrap_or(defaults.temperature as f64);
        if !(temperature > 0.0 && temperature <= 1.0) {
            return Err(out_of_range("temperature", "must be in (0, 1]"));
        }

        let top_k = optional_int(fields, "top_k")?.unwrap_or(defaults.top_k as u64);
        if top_k < 1 {
            return Err(out_of_range("top_k", "must be >= 1"));
        }
        let top_k = u32::try_from(top_k).map_err(|_| out_of_range("top_k", "must fit in 32 bits"))?;

        let top_p = optional_float(fields, "top_p")?.unwrap_or(defaults.top_p as f64);
        if !(top_p > 0.0 && top_p <= 1.0) {
            return Err(out_of_range("top_p", "must be in (0, 1]"));
        }

        let repetition_penalty = optional_float(fields, "repetition_penalty")?
            .unwrap_or(defaults.repetition_penalty as f64);
        if repetition_penalty < 1.0 {
            return Err(out_of_range("repetition_penalty", "must be >= 1"));
        }

        // the runtime reads the seed as a signed 64-bit integer
        let seed = optional_int(fields, "seed")?;
        if seed.is_some_and(|s| s > i64::MAX as u64) {
            return Err(out_of_range("seed", "must be <= 9223372036854775807"));
        }

        Ok(PredictRequest {
            question,
            params: GenerationParams {
                max_tokens,
                temperature: temperature as f32,
                top_k,
                top_p: top_p as f32,
                repetition_penalty: repetition_penalty as f32,
                seed,
            },
        })
    }
}

// Reads the body ourselves so JSON and field errors share the 400 detail shape.
// Buffering failures keep the rejection's own status (413 over the limit).
impl<S> FromRequest<S> for PredictRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Body {
                status: e.status(),
                detail: e.body_text(),
            })?;
        Ok(PredictRequest::from_slice(&body)?)
    }
}

fn out_of_range(field: &'static str, constraint: &'static str) -> ValidationError {
    ValidationError::OutOfRange { field, constraint }
}

// null counts as absent
fn present<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    fields.get(field).filter(|v| !v.is_null())
}

fn required_text(fields: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match present(fields, field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "a string",
        }),
    }
}

fn optional_int(fields: &Map<String, Value>, field: &'static str) -> Result<Option<u64>, ValidationError> {
    let Some(value) = present(fields, field) else {
        return Ok(None);
    };
    let invalid = || ValidationError::InvalidType {
        field,
        expected: "an integer",
    };
    let negative = || out_of_range(field, "must not be negative");

    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(Some(v))
            } else if n.as_i64().is_some() {
                Err(negative())
            } else {
                n.as_f64().map_or(Err(invalid()), |f| integral_float(f, invalid, negative))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<u64>() {
                Ok(Some(v))
            } else if s.parse::<i64>().is_ok() {
                Err(negative())
            } else {
                Err(invalid())
            }
        }
        _ => Err(invalid()),
    }
}

// 80.0 is an integer, 80.5 is not
fn integral_float(
    f: f64,
    invalid: impl Fn() -> ValidationError,
    negative: impl Fn() -> ValidationError,
) -> Result<Option<u64>, ValidationError> {
    if !f.is_finite() || f.fract() != 0.0 {
        Err(invalid())
    } else if f < 0.0 {
        Err(negative())
    } else if f > u64::MAX as f64 {
        Err(invalid())
    } else {
        Ok(Some(f as u64))
    }
}

fn optional_float(fields: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    let Some(value) = present(fields, field) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(Some(f)),
        _ => Err(ValidationError::InvalidType {
            field,
            expected: "a number",
        }),
    }
}

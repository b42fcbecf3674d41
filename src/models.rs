use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_TOKENS: u32 = 80;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TOP_K: u32 = 50;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_REPETITION_PENALTY: f32 = 1.2;

/// A validated `/predict` request with every default already filled in.
///
/// Built by [`crate::validation`] from the raw JSON body, never deserialized
/// directly, so field-level errors can name the offending field.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub question: String,
    pub params: GenerationParams,
}

// Sampling controls handed to the model runtime
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            repetition_penalty: DEFAULT_REPETITION_PENALTY,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredictResponse {
    pub answer: String,
}

// Body of every error response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model: String,
    pub runtime: String,
    pub timestamp: String,
}

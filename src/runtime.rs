//! Client for the model runtime that holds the fine-tuned weights.
//!
//! The runtime speaks the Ollama HTTP API. The model is loaded once at
//! startup and pinned in memory; a background task keeps the readiness flag
//! in sync with what the runtime reports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{Duration, interval};

use crate::config::normalize_url;
use crate::error::RuntimeError;
use crate::metrics::MODEL_READY;
use crate::models::GenerationParams;
use crate::prompt::QUESTION_MARKER;

// keep the weights resident until the runtime shuts down
const KEEP_ALIVE_FOREVER: i64 = -1;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The seam between the HTTP layer and whatever produces text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Completes `prompt` and returns only the newly generated text.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, RuntimeError>;

    fn is_ready(&self) -> bool;

    fn model_name(&self) -> &str;

    fn endpoint(&self) -> &str;
}

// Ollama /api/generate request format
#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    raw: bool,
    stream: bool,
    keep_alive: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<SamplingOptions<'a>>,
}

#[derive(Serialize)]
struct SamplingOptions<'a> {
    num_predict: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    repeat_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    stop: [&'a str; 1],
}

impl<'a> From<&GenerationParams> for SamplingOptions<'a> {
    fn from(params: &GenerationParams) -> Self {
        Self {
            num_predict: params.max_tokens,
            temperature: params.temperature,
            top_k: params.top_k,
            top_p: params.top_p,
            repeat_penalty: params.repetition_penalty,
            seed: params.seed,
            stop: [QUESTION_MARKER],
        }
    }
}

// Ollama /api/generate response format
#[derive(Deserialize)]
struct GenerateReply {
    response: String,
}

#[derive(Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

pub struct OllamaRuntime {
    client: reqwest::Client,
    url: String,
    model: String,
    ready: AtomicBool,
}

impl OllamaRuntime {
    pub fn new(client: reqwest::Client, url: &str, model: impl Into<String>) -> Self {
        Self {
            client,
            url: normalize_url(url),
            model: model.into(),
            ready: AtomicBool::new(false),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
        MODEL_READY.set(if ready { 1.0 } else { 0.0 });
    }

    /// Checks the model is registered and asks the runtime to load it.
    ///
    /// An empty-prompt generate call makes Ollama load the weights without
    /// producing tokens; `keep_alive: -1` keeps them loaded afterwards.
    pub async fn load(&self) -> Result<(), RuntimeError> {
        tracing::info!(model = %self.model, runtime = %self.url, "Loading model");

        if !self.model_listed(None).await? {
            self.set_ready(false);
            return Err(RuntimeError::ModelMissing(self.model.clone()));
        }

        let body = GenerateBody {
            model: &self.model,
            prompt: None,
            raw: true,
            stream: false,
            keep_alive: KEEP_ALIVE_FOREVER,
            options: None,
        };
        let res = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await?;
        check_status(res).await?;

        self.set_ready(true);
        tracing::info!(model = %self.model, "Model loaded");
        Ok(())
    }

    /// Asks the runtime whether the model is still available.
    pub async fn probe(&self) -> bool {
        match self.model_listed(Some(PROBE_TIMEOUT)).await {
            Ok(listed) => listed,
            Err(e) => {
                tracing::debug!(error = %e, "Runtime probe failed");
                false
            }
        }
    }

    async fn model_listed(&self, timeout: Option<Duration>) -> Result<bool, RuntimeError> {
        let mut req = self.client.get(format!("{}/api/tags", self.url));
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        let res = check_status(req.send().await?).await?;
        let tags: TagsReply = res.json().await?;
        Ok(tags.models.iter().any(|m| same_model(&m.name, &self.model)))
    }
}

#[async_trait]
impl TextGenerator for OllamaRuntime {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, RuntimeError> {
        let body = GenerateBody {
            model: &self.model,
            prompt: Some(prompt),
            raw: true,
            stream: false,
            keep_alive: KEEP_ALIVE_FOREVER,
            options: Some(SamplingOptions::from(params)),
        };

        let res = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await?;
        let reply: GenerateReply = check_status(res).await?.json().await?;
        Ok(reply.response)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

// "gemma2-finetuned" is listed as "gemma2-finetuned:latest"
fn same_model(listed: &str, wanted: &str) -> bool {
    listed == wanted || listed.strip_suffix(":latest") == Some(wanted)
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, RuntimeError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorReply>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(RuntimeError::Backend {
        status: status.as_u16(),
        message,
    })
}

// Health check loop - probes the runtime every `check_interval`
pub async fn health_checker(runtime: Arc<OllamaRuntime>, check_interval: Duration) {
    let mut interval = interval(check_interval);
    tracing::info!(interval = ?check_interval, "Runtime health checker started");

    loop {
        interval.tick().await;

        let was_ready = runtime.is_ready();
        let is_ready = runtime.probe().await;
        runtime.set_ready(is_ready);

        // Log status changes
        if was_ready != is_ready {
            if is_ready {
                tracing::info!(runtime = %runtime.endpoint(), "Model runtime is now healthy");
            } else {
                tracing::warn!(runtime = %runtime.endpoint(), "Model runtime is now unhealthy");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runtime_for(server: &MockServer) -> OllamaRuntime {
        OllamaRuntime::new(reqwest::Client::new(), &server.uri(), "gemma2-finetuned")
    }

    async fn mount_tags(server: &MockServer, names: &[&str]) {
        let models: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn generate_forwards_prompt_and_sampling_options() -> Result<(), RuntimeError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "gemma2-finetuned",
                "prompt": "질문: q\n답변:",
                "raw": true,
                "stream": false,
                "options": {
                    "num_predict": 80,
                    "top_k": 50,
                    "seed": 11,
                    "stop": ["질문:"]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gemma2-finetuned",
                "response": " 꾸준히 하세요.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = GenerationParams {
            seed: Some(11),
            ..GenerationParams::default()
        };
        let text = runtime_for(&server).generate("질문: q\n답변:", &params).await?;
        assert_eq!(text, " 꾸준히 하세요.");
        Ok(())
    }

    #[tokio::test]
    async fn generate_surfaces_runtime_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "error": "out of memory" })),
            )
            .mount(&server)
            .await;

        let result = runtime_for(&server)
            .generate("질문: q\n답변:", &GenerationParams::default())
            .await;
        match result {
            Err(RuntimeError::Backend { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "out of memory");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_rejects_reply_without_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": 1 })))
            .mount(&server)
            .await;

        let result = runtime_for(&server)
            .generate("질문: q\n답변:", &GenerationParams::default())
            .await;
        assert!(matches!(result, Err(RuntimeError::Transport(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn load_marks_runtime_ready() -> Result<(), RuntimeError> {
        let server = MockServer::start().await;
        mount_tags(&server, &["gemma2-finetuned:latest"]).await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({ "model": "gemma2-finetuned", "keep_alive": -1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gemma2-finetuned",
                "response": "",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let runtime = runtime_for(&server);
        assert!(!runtime.is_ready());
        runtime.load().await?;
        assert!(runtime.is_ready());
        Ok(())
    }

    #[tokio::test]
    async fn load_fails_when_model_is_not_registered() {
        let server = MockServer::start().await;
        mount_tags(&server, &["llama3:latest"]).await;

        let runtime = runtime_for(&server);
        let result = runtime.load().await;
        assert!(matches!(result, Err(RuntimeError::ModelMissing(ref m)) if m == "gemma2-finetuned"));
        assert!(!runtime.is_ready());
    }

    #[tokio::test]
    async fn probe_reports_unreachable_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!runtime_for(&server).probe().await);
    }

    #[test]
    fn model_names_match_with_or_without_latest_tag() {
        assert!(same_model("gemma2-finetuned:latest", "gemma2-finetuned"));
        assert!(same_model("gemma2-finetuned", "gemma2-finetuned"));
        assert!(same_model("gemma2-finetuned:q4", "gemma2-finetuned:q4"));
        assert!(!same_model("gemma2-finetuned:q4", "gemma2-finetuned"));
    }
}

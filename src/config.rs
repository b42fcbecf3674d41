use clap::Parser;
use std::time::Duration;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "faq-answer-server")]
#[command(about = "HTTP answer service for the fine-tuned education FAQ model")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 7860)]
    pub port: u16,

    // Model runtime url, "localhost:11434" is accepted too
    #[arg(short, long, env = "MODEL_RUNTIME_URL", default_value = "http://localhost:11434")]
    pub runtime_url: String,

    // Name the fine-tuned model is registered under in the runtime
    #[arg(short, long, env = "MODEL_NAME", default_value = "gemma2-finetuned")]
    pub model: String,

    // Runtime health check interval in seconds
    #[arg(long, env = "HEALTH_INTERVAL_SECS", default_value_t = 30)]
    pub health_interval: u64,

    // Per-call generation timeout in seconds, unset means no timeout
    #[arg(long, env = "GENERATION_TIMEOUT_SECS")]
    pub generation_timeout_secs: Option<u64>,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval.max(1))
    }

    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_secs.map(Duration::from_secs)
    }
}

// add http:// if the scheme is missing and drop trailing slashes
pub fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

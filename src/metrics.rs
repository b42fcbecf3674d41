use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};

// generation on CPU can take well over a minute
const LATENCY_BUCKETS: &[f64] = &[0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 90.0, 120.0];

lazy_static! {
    pub static ref PREDICT_TOTAL: Counter =
        register_counter!("faq_predict_requests_total", "Total number of predict requests")
            .expect("register faq_predict_requests_total");
    pub static ref PREDICT_FAILURES: CounterVec = register_counter_vec!(
        "faq_predict_failures_total",
        "Failed predict requests by kind",
        &["kind"]
    )
    .expect("register faq_predict_failures_total");
    pub static ref PREDICT_LATENCY: Histogram = register_histogram!(
        "faq_predict_latency_seconds",
        "Predict request latency in seconds",
        LATENCY_BUCKETS.to_vec()
    )
    .expect("register faq_predict_latency_seconds");
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "faq_generation_latency_seconds",
        "Model runtime generation latency in seconds",
        LATENCY_BUCKETS.to_vec()
    )
    .expect("register faq_generation_latency_seconds");
    pub static ref MODEL_READY: Gauge =
        register_gauge!("faq_model_ready", "1 when the model runtime is ready")
            .expect("register faq_model_ready");
}

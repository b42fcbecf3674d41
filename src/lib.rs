//! HTTP answer service for a fine-tuned education FAQ model.
//!
//! `POST /predict` validates the question and sampling parameters, hands the
//! prompt to the model runtime and returns the cleaned-up answer.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod prompt;
pub mod runtime;
pub mod server;
pub mod state;
pub mod validation;
